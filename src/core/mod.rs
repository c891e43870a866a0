//! Core engine: playback state machine, timers, event bus, frame loading.
//!
//! Nothing here depends on the UI toolkit.

pub mod controls;
pub mod display;
pub mod dvr;
pub mod event_bus;
pub mod frame_loader;
pub mod frame_path;
pub mod session;
pub mod timers;
pub mod viewer;
pub mod viewer_events;
pub mod workers;

pub use controls::ControlSurface;
pub use display::FrameDisplay;
pub use dvr::{Control, DvrState};
pub use event_bus::EventBus;
pub use frame_loader::{FrameLoader, LoadResult};
pub use viewer::{Viewer, ViewerError};
pub use workers::Workers;
