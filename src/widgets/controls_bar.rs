//! Transport buttons and read-only status fields.
//!
//! Buttons only emit [`ControlPressedEvent`]; enablement comes straight from
//! the viewer's [`ControlSurface`].

use eframe::egui;

use crate::core::controls::ControlSurface;
use crate::core::dvr::Control;
use crate::core::event_bus::BoxedEvent;
use crate::core::viewer_events::ControlPressedEvent;

const BUTTON_SIZE: [f32; 2] = [36.0, 24.0];

pub fn render(ui: &mut egui::Ui, controls: &ControlSurface, mut dispatch: impl FnMut(BoxedEvent)) {
    ui.horizontal(|ui| {
        for control in Control::ALL {
            let button = egui::Button::new(control.label()).min_size(BUTTON_SIZE.into());
            let response = ui
                .add_enabled(controls.is_enabled(control), button)
                .on_hover_text(control.tooltip());
            if response.clicked() {
                dispatch(Box::new(ControlPressedEvent(control)));
            }
        }

        ui.separator();
        status_field(ui, "Event", &controls.status.event_number, 64.0);
        status_field(ui, "Frame", &controls.status.frame, 48.0);
        status_field(ui, "Speed", &controls.status.speed, 40.0);
    });
}

fn status_field(ui: &mut egui::Ui, label: &str, value: &str, width: f32) {
    ui.label(label);
    let mut text = value;
    ui.add(
        egui::TextEdit::singleline(&mut text)
            .desired_width(width)
            .font(egui::TextStyle::Monospace),
    );
}
