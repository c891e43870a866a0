//! Entities - externally supplied data the viewer browses.

pub mod event_list;

pub use event_list::{Event, EventList};
