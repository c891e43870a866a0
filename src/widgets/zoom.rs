//! Zoom slider and displayed image size.
//!
//! The displayed size is fixed per event: it is taken from the first image
//! shown after an event change and multiplied by the zoom factor, so frames of
//! one event never jump around while playing.

use eframe::egui;

use crate::config::{ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomState {
    zoom: f32,
    /// Natural size of the event's images, once known
    base: Option<egui::Vec2>,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self::new(ZOOM_MIN)
    }
}

impl ZoomState {
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom: snap(zoom),
            base: None,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = snap(zoom);
    }

    /// Forget the base size; the next shown image provides it
    pub fn reapply(&mut self) {
        self.base = None;
    }

    /// Record the natural size of a shown image
    pub fn observe(&mut self, natural: egui::Vec2) {
        if self.base.is_none() {
            self.base = Some(natural);
        }
    }

    pub fn display_size(&self) -> Option<egui::Vec2> {
        self.base.map(|b| b * self.zoom)
    }

    /// Render the slider. Returns true when the zoom changed.
    pub fn render(&mut self, ui: &mut egui::Ui) -> bool {
        let mut value = self.zoom;
        let response = ui.add(
            egui::Slider::new(&mut value, ZOOM_MIN..=ZOOM_MAX)
                .step_by(ZOOM_STEP as f64)
                .text("Zoom"),
        );
        if response.changed() && value != self.zoom {
            self.set_zoom(value);
            return true;
        }
        false
    }
}

fn snap(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return ZOOM_MIN;
    }
    ((zoom / ZOOM_STEP).round() * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX)
}
