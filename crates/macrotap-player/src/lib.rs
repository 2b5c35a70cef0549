//! macrotap-player - replay gesture macros
//!
//! Runs the actions committed in a [`MacroHandle`](macrotap_core::MacroHandle)
//! through a [`GestureDispatcher`], with per-step timing, repeat counts and
//! mid-run cancellation. Also stores named presets on disk.

pub mod dispatch;
pub mod player;
pub mod simulated;
pub mod storage;

pub use dispatch::{DispatchOutcome, Gesture, GestureDispatcher, StrokeFloors};
pub use player::{PlaybackConfig, PlaybackState, PlaybackStats, Player};
pub use simulated::SimulatedDispatcher;
pub use storage::{Preset, PresetStorage, PresetStore};

pub mod prelude {
    pub use crate::dispatch::{DispatchOutcome, Gesture, GestureDispatcher};
    pub use crate::player::{PlaybackConfig, PlaybackState, PlaybackStats, Player};
    pub use crate::simulated::SimulatedDispatcher;
    pub use crate::storage::{PresetStorage, PresetStore};
}
