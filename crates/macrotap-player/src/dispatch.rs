//! Gesture dispatch boundary
//!
//! The engine turns each enabled action into a [`Gesture`] and hands it to a
//! [`GestureDispatcher`]. How the gesture reaches the screen is the
//! dispatcher's business; the engine only awaits the outcome.

use futures::future::BoxFuture;
use macrotap_core::{AbsolutePoint, Action, ActionId, ActionKind};
use std::fmt;
use std::time::Duration;

/// Lower bounds applied to stroke durations before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokeFloors {
    /// Shortest tap stroke
    pub click: Duration,
    /// Long presses shorter than this are treated as unset...
    pub long_press_min: Duration,
    /// ...and replaced by this
    pub long_press_fallback: Duration,
}

impl Default for StrokeFloors {
    fn default() -> Self {
        Self {
            click: Duration::from_millis(50),
            long_press_min: Duration::from_millis(100),
            long_press_fallback: Duration::from_millis(500),
        }
    }
}

/// One single-stroke pointer gesture in the absolute frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub action_id: ActionId,
    pub kind: ActionKind,
    /// Stroke path, at least two points
    pub path: Vec<AbsolutePoint>,
    pub duration: Duration,
}

impl Gesture {
    /// Build the gesture for `action`. `None` for waits and for actions whose
    /// points don't match their kind.
    pub fn for_action(action: &Action, floors: &StrokeFloors) -> Option<Self> {
        let requested = Duration::from_millis(action.duration);
        let (path, duration) = match (action.kind, action.points.as_slice()) {
            (ActionKind::Click, [at]) => (press_path(*at), requested.max(floors.click)),
            (ActionKind::LongClick, [at]) => {
                let duration = if requested < floors.long_press_min {
                    floors.long_press_fallback
                } else {
                    requested
                };
                (press_path(*at), duration)
            }
            (ActionKind::Swipe, [from, to]) => (vec![*from, *to], requested),
            _ => return None,
        };
        Some(Self {
            action_id: action.id,
            kind: action.kind,
            path,
            duration,
        })
    }

    pub fn start(&self) -> Option<AbsolutePoint> {
        self.path.first().copied()
    }

    pub fn end(&self) -> Option<AbsolutePoint> {
        self.path.last().copied()
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (Some(a), Some(b)) = (self.start(), self.end()) else {
            return write!(f, "{} with no path", self.kind);
        };
        match self.kind {
            ActionKind::Swipe => write!(
                f,
                "swipe ({}, {}) -> ({}, {}) over {}ms",
                a.x,
                a.y,
                b.x,
                b.y,
                self.duration.as_millis()
            ),
            kind => write!(f, "{} at ({}, {}) for {}ms", kind, a.x, a.y, self.duration.as_millis()),
        }
    }
}

/// A press is a 1px stroke starting on the point.
fn press_path(at: AbsolutePoint) -> Vec<AbsolutePoint> {
    vec![at, AbsolutePoint::new(at.x + 1.0, at.y + 1.0)]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    /// The system interrupted the gesture
    Cancelled,
    /// The gesture was never performed
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

/// Performs gestures on the device.
///
/// The returned future resolves once the gesture is over. Dropping it must be
/// safe: the engine drops in-flight dispatches when playback stops.
pub trait GestureDispatcher: Send + Sync {
    fn dispatch(&self, gesture: Gesture) -> BoxFuture<'static, DispatchOutcome>;
}

impl<D: GestureDispatcher + ?Sized> GestureDispatcher for std::sync::Arc<D> {
    fn dispatch(&self, gesture: Gesture) -> BoxFuture<'static, DispatchOutcome> {
        (**self).dispatch(gesture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32, y: f32) -> AbsolutePoint {
        AbsolutePoint::new(x, y)
    }

    #[test]
    fn click_stroke_is_floored() {
        let action = Action::click(1, at(10.0, 20.0)).with_timing(10, 500);
        let g = Gesture::for_action(&action, &StrokeFloors::default()).unwrap();
        assert_eq!(g.duration, Duration::from_millis(50));
        assert_eq!(g.path, vec![at(10.0, 20.0), at(11.0, 21.0)]);
    }

    #[test]
    fn short_long_press_falls_back() {
        let floors = StrokeFloors::default();
        let short = Action::long_click(1, at(0.0, 0.0)).with_timing(99, 500);
        assert_eq!(
            Gesture::for_action(&short, &floors).unwrap().duration,
            Duration::from_millis(500)
        );
        let normal = Action::long_click(1, at(0.0, 0.0));
        assert_eq!(
            Gesture::for_action(&normal, &floors).unwrap().duration,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn swipe_keeps_its_duration() {
        let action = Action::swipe(3, at(50.0, 50.0), at(250.0, 250.0)).with_timing(20, 500);
        let g = Gesture::for_action(&action, &StrokeFloors::default()).unwrap();
        assert_eq!(g.path, vec![at(50.0, 50.0), at(250.0, 250.0)]);
        assert_eq!(g.duration, Duration::from_millis(20));
        assert_eq!(g.action_id, 3);
    }

    #[test]
    fn hand_built_gesture_without_path_is_safe() {
        let g = Gesture {
            action_id: 7,
            kind: ActionKind::Click,
            path: Vec::new(),
            duration: Duration::from_millis(50),
        };
        assert_eq!(g.start(), None);
        assert_eq!(g.end(), None);
        assert_eq!(g.to_string(), "click with no path");

        let swipe = Action::swipe(3, at(1.0, 2.0), at(3.0, 4.0));
        let g = Gesture::for_action(&swipe, &StrokeFloors::default()).unwrap();
        assert_eq!((g.start(), g.end()), (Some(at(1.0, 2.0)), Some(at(3.0, 4.0))));
    }

    #[test]
    fn waits_and_malformed_actions_have_no_gesture() {
        let floors = StrokeFloors::default();
        assert!(Gesture::for_action(&Action::wait(1, 100), &floors).is_none());
        let broken = Action::new(2, ActionKind::Swipe, vec![at(1.0, 1.0)]);
        assert!(Gesture::for_action(&broken, &floors).is_none());
    }
}
