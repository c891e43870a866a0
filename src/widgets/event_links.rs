//! Side panel listing every event as a clickable link.

use eframe::egui;

use crate::core::event_bus::BoxedEvent;
use crate::core::viewer_events::PlayEventRequest;
use crate::entities::EventList;

/// Render the list header and one link per event; `current` is highlighted.
pub fn render(
    ui: &mut egui::Ui,
    events: Option<&EventList>,
    current: Option<usize>,
    mut dispatch: impl FnMut(BoxedEvent),
) {
    let Some(events) = events.filter(|e| !e.is_empty()) else {
        ui.heading("No event data available.");
        ui.label("Start zmeview with an event list JSON (see zmeview --help).");
        return;
    };

    ui.horizontal(|ui| {
        ui.label("Location:");
        let mut location = events.location();
        ui.add(egui::TextEdit::singleline(&mut location).desired_width(f32::INFINITY));
    });
    ui.label(events.updated_label());
    ui.separator();

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.horizontal_wrapped(|ui| {
            for (index, event) in events.list.iter().enumerate() {
                let link = ui.selectable_label(current == Some(index), event.number.as_str());
                if link.clicked() {
                    dispatch(Box::new(PlayEventRequest(index)));
                }
            }
        });
    });
}
