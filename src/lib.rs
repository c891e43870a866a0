//! ZMEVIEW - frame-by-frame viewer for recorded camera events
//!
//! Re-exports all modules for use by the binary target.

// Core engine (state machine, timers, events, frame loading)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod help;
pub mod main_events;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};
pub use core::viewer::{Viewer, ViewerError};

// Re-export entities
pub use entities::{Event, EventList};
