//! Control surface: enabled flags of the eight buttons plus the three
//! read-only status fields under them.
//!
//! The UI reads this every frame; only the viewer writes it.

use super::dvr::{Control, ControlSet, Toggle};

/// Read-only status display (event number, frame number, speed)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFields {
    pub event_number: String,
    pub frame: String,
    pub speed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSurface {
    enabled: [bool; 8],
    pub status: StatusFields,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ControlSurface {
    /// Everything disabled, status blank (state before the first event loads)
    pub fn disabled() -> Self {
        Self {
            enabled: [false; 8],
            status: StatusFields::default(),
        }
    }

    pub fn is_enabled(&self, control: Control) -> bool {
        self.enabled[control.index()]
    }

    pub fn set_enabled(&mut self, control: Control, enabled: bool) {
        self.enabled[control.index()] = enabled;
    }

    /// Apply a transition set; `Keep` entries are left untouched
    pub fn apply(&mut self, set: &ControlSet) {
        for (control, toggle) in set.iter() {
            match toggle {
                Toggle::On => self.set_enabled(control, true),
                Toggle::Off => self.set_enabled(control, false),
                Toggle::Keep => {}
            }
        }
    }

    /// Controls currently enabled, in on-screen order
    pub fn enabled_controls(&self) -> Vec<Control> {
        Control::ALL
            .iter()
            .copied()
            .filter(|c| self.is_enabled(*c))
            .collect()
    }

    pub fn set_event_number(&mut self, event_number: &str) {
        self.status.event_number = event_number.to_string();
    }

    pub fn set_frame(&mut self, frame: u32) {
        self.status.frame = frame.to_string();
    }

    pub fn set_speed(&mut self, speed: i32) {
        self.status.speed = speed.to_string();
    }
}
