//! Keyboard help overlay.

use eframe::egui;

/// Single help entry (key binding + description)
#[derive(Clone, Debug)]
pub struct HelpEntry {
    pub key: &'static str,
    pub desc: &'static str,
}

impl HelpEntry {
    pub const fn new(key: &'static str, desc: &'static str) -> Self {
        Self { key, desc }
    }
}

/// Transport shortcuts, in button order
pub const CONTROLS_HELP: &[HelpEntry] = &[
    HelpEntry::new("PageUp", "Previous event"),
    HelpEntry::new("J", "Fast reverse (press again to double)"),
    HelpEntry::new("Left", "Step back one frame"),
    HelpEntry::new("K / Space", "Pause / Play"),
    HelpEntry::new("Right", "Step forward one frame"),
    HelpEntry::new("L", "Fast forward (press again to double)"),
    HelpEntry::new("PageDown", "Next event"),
];

pub const GLOBAL_HELP: &[HelpEntry] = &[
    HelpEntry::new("F1", "Toggle this help"),
];

/// Render help overlay
pub fn render_help_overlay(ui: &mut egui::Ui) {
    let font_id = egui::FontId::proportional(13.0);
    let text_color = egui::Color32::from_rgba_unmultiplied(255, 255, 255, 200);
    let key_color = egui::Color32::from_rgb(255, 200, 100);

    let max_key_len = CONTROLS_HELP
        .iter()
        .chain(GLOBAL_HELP.iter())
        .map(|e| e.key.len())
        .max()
        .unwrap_or(10);
    let max_key_width = (max_key_len as f32) * 8.0 + 20.0;

    let render_entries = |ui: &mut egui::Ui, entries: &[HelpEntry]| {
        for entry in entries {
            ui.horizontal(|ui| {
                ui.add_sized(
                    [max_key_width, 18.0],
                    egui::Label::new(
                        egui::RichText::new(entry.key)
                            .font(font_id.clone())
                            .color(key_color),
                    ),
                );
                ui.label(
                    egui::RichText::new(entry.desc)
                        .font(font_id.clone())
                        .color(text_color),
                );
            });
        }
    };

    egui::Frame::NONE
        .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180))
        .inner_margin(12.0)
        .corner_radius(4.0)
        .show(ui, |ui| {
            render_entries(ui, CONTROLS_HELP);
            ui.add_space(8.0);
            ui.separator();
            ui.add_space(4.0);
            render_entries(ui, GLOBAL_HELP);
        });
}
