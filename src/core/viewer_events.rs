//! Viewer events carried on the event bus.

use super::dvr::Control;

// === Requests (UI -> viewer) ===

/// One of the eight transport buttons (or its shortcut) was pressed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlPressedEvent(pub Control);

/// An event link was clicked
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayEventRequest(pub usize);

/// Space/K: pause when moving, play otherwise
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TogglePauseEvent;

// === Notifications (viewer -> listeners) ===

/// A new event finished loading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventChangedEvent {
    pub index: usize,
    pub in_reverse: bool,
}
