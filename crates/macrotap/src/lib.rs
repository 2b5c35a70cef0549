//! # macrotap
//!
//! Author pointer-gesture macros by dragging markers over the screen, then
//! replay them against the same absolute coordinates, any number of times.
//!
//! ## Features
//!
//! - **Authoring**: marker state machine with create, edit, confirm, cancel
//! - **Visual sync**: markers rebuilt from the committed actions on every surface
//! - **Playback**: cancellable, loop-controlled replay with per-step timing
//! - **Presets**: named macros stored as JSON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use macrotap::prelude::*;
//! use macrotap::headless::{HeadlessPrompt, HeadlessSurface};
//!
//! let macros = MacroHandle::new();
//! let surface = HeadlessSurface::new(Size::new(1080.0, 1920.0));
//! let mut session =
//!     AuthoringSession::new(surface, HeadlessPrompt::new()).with_macros(macros.clone());
//! session.begin_create(ActionKind::Click);
//! session.confirm();
//!
//! let rt = tokio::runtime::Runtime::new()?;
//! rt.block_on(async {
//!     let player = Player::new(SimulatedDispatcher::new(), macros);
//!     player.start()?;
//!     player.wait_stopped().await;
//!     Ok::<(), macrotap::Error>(())
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```

// Re-export authoring
pub use macrotap_core::*;

// Re-export playback and storage
pub use macrotap_player as player;
pub use macrotap_player::{
    DispatchOutcome, Gesture, GestureDispatcher, PlaybackConfig, PlaybackState, PlaybackStats,
    Player, Preset, PresetStorage, PresetStore, SimulatedDispatcher, StrokeFloors,
};

/// Prelude - import everything you need
pub mod prelude {
    pub use macrotap_core::prelude::*;
    pub use macrotap_player::prelude::*;
}
