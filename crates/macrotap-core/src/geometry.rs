//! Coordinate frames
//!
//! Markers live in the host surface's local frame, actions are stored in the
//! absolute (screen) frame. The two point types do not mix: the only way from
//! one to the other is [`to_absolute`] / [`to_local`] with the surface offset
//! read at the time of the call. Never cache an [`Offset`] across events, the
//! surface can be moved between two drags.

use serde::{Deserialize, Serialize};

/// Point in the absolute frame, independent of where the surface sits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsolutePoint {
    pub x: f32,
    pub y: f32,
}

/// Point relative to the host surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalPoint {
    pub x: f32,
    pub y: f32,
}

/// On-screen position of the host surface's origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl AbsolutePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl LocalPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Same frame, moved by a drag delta.
    pub fn translate(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl Offset {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> LocalPoint {
        LocalPoint::new(self.width / 2.0, self.height / 2.0)
    }
}

pub fn to_absolute(local: LocalPoint, offset: Offset) -> AbsolutePoint {
    AbsolutePoint::new(local.x + offset.dx, local.y + offset.dy)
}

pub fn to_local(absolute: AbsolutePoint, offset: Offset) -> LocalPoint {
    LocalPoint::new(absolute.x - offset.dx, absolute.y - offset.dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn round_trip_through_both_frames() {
        let offsets = [
            Offset::new(0.0, 0.0),
            Offset::new(12.5, -40.0),
            Offset::new(-300.25, 1080.0),
        ];
        let points = [
            LocalPoint::new(0.0, 0.0),
            LocalPoint::new(100.0, 100.0),
            LocalPoint::new(-7.75, 2400.5),
        ];
        for offset in offsets {
            for p in points {
                let back = to_local(to_absolute(p, offset), offset);
                assert!(close(back.x, p.x) && close(back.y, p.y), "{:?} {:?}", p, offset);
            }
        }
    }

    #[test]
    fn moved_surface_changes_local_not_absolute() {
        let abs = AbsolutePoint::new(150.0, 150.0);
        let before = to_local(abs, Offset::new(0.0, 50.0));
        let after = to_local(abs, Offset::new(100.0, 50.0));
        assert_eq!(before, LocalPoint::new(150.0, 100.0));
        assert_eq!(after, LocalPoint::new(50.0, 100.0));
    }

    #[test]
    fn center_of_surface() {
        assert_eq!(Size::new(1080.0, 1920.0).center(), LocalPoint::new(540.0, 960.0));
    }
}
