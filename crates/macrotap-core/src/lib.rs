//! macrotap-core - gesture macro authoring
//!
//! Place draggable markers over live screen content and commit them as an
//! ordered list of gestures (tap, long press, swipe, wait).
//!
//! ## Pieces
//!
//! - **action**: the gesture step value type and its timing defaults
//! - **geometry**: local vs. absolute coordinate frames
//! - **macro_set**: committed actions, shared with playback
//! - **authoring**: the marker state machine
//! - **surface**: what the host UI must provide
//! - **headless**: in-memory host for scripting and tests

pub mod action;
pub mod authoring;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod macro_set;
pub mod notify;
pub mod settings;
pub mod surface;
mod visuals;

pub use action::{Action, ActionId, ActionKind};
pub use authoring::{AuthoringConfig, AuthoringSession, AuthoringState, PendingOrigin};
pub use error::{Error, ErrorCode, Result};
pub use geometry::{to_absolute, to_local, AbsolutePoint, LocalPoint, Offset, Size};
pub use macro_set::{MacroHandle, MacroSet};
pub use notify::{Notification, Notifier};
pub use settings::Settings;
pub use surface::{
    ConfirmationPrompt, FocusLease, HostSurface, InputFocus, MarkerSpec, NoFocus, PromptRequest,
    PromptValues, SurfaceEvent, VisualId,
};
pub use visuals::VisualBinding;

pub mod prelude {
    pub use crate::action::{Action, ActionId, ActionKind};
    pub use crate::authoring::{AuthoringSession, AuthoringState};
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::geometry::{AbsolutePoint, LocalPoint, Offset, Size};
    pub use crate::macro_set::MacroHandle;
    pub use crate::notify::{Notification, Notifier};
    pub use crate::surface::{ConfirmationPrompt, HostSurface, SurfaceEvent};
}
