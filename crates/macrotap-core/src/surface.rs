//! Host-side collaborators: the surface markers live on, the timing prompt and
//! input focus
//!
//! The core never draws anything. It asks the surface to add, move, show and
//! remove visuals, and receives the user's raw interactions back as
//! [`SurfaceEvent`]s through `AuthoringSession::handle_event`.

use crate::action::ActionKind;
use crate::geometry::{LocalPoint, Offset, Size};
use std::sync::Arc;

/// Handle of one visual (marker or line) owned by the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub label: String,
    pub center: LocalPoint,
    pub visible: bool,
}

pub trait HostSurface {
    /// Current on-screen position of the surface. Read it on every use.
    fn offset(&self) -> Offset;
    fn size(&self) -> Size;
    fn add_marker(&mut self, spec: MarkerSpec) -> VisualId;
    fn add_line(&mut self, from: LocalPoint, to: LocalPoint, visible: bool) -> VisualId;
    fn move_marker(&mut self, id: VisualId, center: LocalPoint);
    fn update_line(&mut self, id: VisualId, from: LocalPoint, to: LocalPoint);
    /// Hidden visuals do not take part in hit testing.
    fn set_visible(&mut self, id: VisualId, visible: bool);
    fn remove_visual(&mut self, id: VisualId);
}

/// Raw interactions reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// The surface finished a layout pass and its offset is reliable.
    Ready,
    /// A marker got its first on-screen geometry.
    MarkerLaidOut(VisualId),
    Drag { marker: VisualId, dx: f32, dy: f32 },
    Click(VisualId),
}

/// What the prompt should show for the action being confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub kind: ActionKind,
    pub delay_after: u64,
    /// Present only when the kind has an editable duration.
    pub duration: Option<u64>,
}

impl PromptRequest {
    /// Prefill from an action's current timing.
    pub fn for_action(action: &crate::action::Action) -> Self {
        Self {
            kind: action.kind,
            delay_after: action.delay_after,
            duration: action
                .kind
                .prompts_for_duration()
                .then_some(action.duration),
        }
    }
}

/// Raw field contents at the time the user pressed confirm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptValues {
    pub delay_after: String,
    pub duration: Option<String>,
}

pub trait ConfirmationPrompt {
    fn show(&mut self, request: PromptRequest);
    fn values(&self) -> PromptValues;
    fn dismiss(&mut self);
}

/// Keyboard/input focus on the hosting surface, needed while a prompt is up.
pub trait InputFocus: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Focus for hosts that never need to grab it.
#[derive(Debug, Default)]
pub struct NoFocus;

impl InputFocus for NoFocus {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Scoped hold on [`InputFocus`]: acquired on creation, released on drop.
pub struct FocusLease {
    focus: Arc<dyn InputFocus>,
}

impl FocusLease {
    pub fn acquire(focus: Arc<dyn InputFocus>) -> Self {
        focus.acquire();
        Self { focus }
    }
}

impl Drop for FocusLease {
    fn drop(&mut self) {
        self.focus.release();
    }
}

impl std::fmt::Debug for FocusLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FocusLease")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Default)]
    struct Counter(AtomicI32);

    impl InputFocus for Counter {
        fn acquire(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn release(&self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn lease_releases_on_drop() {
        let counter = Arc::new(Counter::default());
        let lease = FocusLease::acquire(counter.clone());
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        drop(lease);
        assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    }
}
