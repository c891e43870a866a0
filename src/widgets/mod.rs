//! UI Widgets
//!
//! Each widget renders from viewer state and talks back through the EventBus

pub mod controls_bar;
pub mod event_links;
pub mod zoom;

pub use zoom::ZoomState;
