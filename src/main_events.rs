//! Application event handling - extracted from main.rs for clarity.
//!
//! Widgets only emit requests; this is the single place that turns them into
//! viewer operations. Rejections are logged by the viewer itself, so results
//! are dropped here.

use log::{debug, trace};

use crate::core::display::FrameDisplay;
use crate::core::event_bus::{BoxedEvent, downcast_event};
use crate::core::viewer::Viewer;
use crate::core::viewer_events::*;

/// Handle one queued event. Returns true if it was recognized.
pub fn handle_viewer_event<D: FrameDisplay>(event: &BoxedEvent, viewer: &mut Viewer<D>) -> bool {
    if let Some(e) = downcast_event::<ControlPressedEvent>(event) {
        debug!("Control pressed: {:?}", e.0);
        let _ = viewer.trigger(e.0);
        return true;
    }
    if let Some(e) = downcast_event::<PlayEventRequest>(event) {
        debug!("Event link clicked: index {}", e.0);
        let _ = viewer.play_event(e.0);
        return true;
    }
    if downcast_event::<TogglePauseEvent>(event).is_some() {
        let _ = viewer.toggle_pause();
        return true;
    }
    if let Some(e) = downcast_event::<EventChangedEvent>(event) {
        // listeners already ran synchronously
        trace!("Event changed to index {} (reverse: {})", e.index, e.in_reverse);
        return true;
    }
    false
}
