//! Per-event playback session: frame pointer, speed, last applied delta and
//! DVR state for the event currently on screen.
//!
//! The frame primitives here only move the pointer and report what happened;
//! displaying the new frame and switching button states is the viewer's job.

use log::{trace, warn};

use super::dvr::DvrState;
use super::frame_path::FramePathResolver;
use super::viewer::ViewerError;
use crate::entities::Event;

/// Result of a frame-moving primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Frame changed and motion may continue
    Moved,
    /// Frame changed and landed on frame 1 or the last frame
    Boundary,
    /// Nothing changed (already at the end in that direction)
    Rejected,
}

impl StepOutcome {
    pub fn keeps_moving(self) -> bool {
        self == StepOutcome::Moved
    }

    pub fn changed_frame(self) -> bool {
        self != StepOutcome::Rejected
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub event_index: usize,
    pub event_number: String,
    pub frame: u32,
    pub last_frame: u32,
    /// Never 0; sign is direction, magnitude is frames per tick
    pub speed: i32,
    /// Delta of the last frame change, 0 if none yet
    pub last_change: i32,
    pub state: DvrState,
    resolver: FramePathResolver,
}

impl PlaybackSession {
    /// Start on frame 1 (REWOUND), or on the last frame (ENDED) when entering in reverse.
    /// `speed` is carried over from the previous session.
    pub fn new(event_index: usize, event: &Event, root: &str, in_reverse: bool, speed: i32) -> Self {
        let last_frame = event.last_frame.max(1);
        let (frame, state) = if in_reverse {
            (last_frame, DvrState::Ended)
        } else {
            (1, DvrState::Rewound)
        };
        Self {
            event_index,
            event_number: event.number.clone(),
            frame,
            last_frame,
            speed: if speed == 0 { 1 } else { speed },
            last_change: 0,
            state,
            resolver: FramePathResolver::new(root, &event.number, event.significant_digits),
        }
    }

    pub fn path(&self) -> String {
        self.resolver.path(self.frame)
    }

    pub fn at_start(&self) -> bool {
        self.frame == 1
    }

    pub fn at_end(&self) -> bool {
        self.frame == self.last_frame
    }

    /// Where the machine rests for the current frame once no timer runs
    pub fn resting_state(&self) -> DvrState {
        if self.at_end() {
            DvrState::Ended
        } else if self.at_start() {
            DvrState::Rewound
        } else {
            DvrState::Paused
        }
    }

    pub fn next_frame(&mut self) -> StepOutcome {
        if self.at_end() {
            warn!("Attempt to advance past last frame ({})", self.last_frame);
            return StepOutcome::Rejected;
        }
        self.apply(1)
    }

    pub fn prev_frame(&mut self) -> StepOutcome {
        if self.at_start() {
            warn!("Attempt to step back from first frame");
            return StepOutcome::Rejected;
        }
        self.apply(-1)
    }

    /// Move `n` frames (negative = back), clamping to stop exactly on the boundary.
    pub fn jump_frames(&mut self, n: i32) -> StepOutcome {
        let actual = if n > 0 {
            if self.at_end() {
                warn!("Attempt to jump past last frame ({})", self.last_frame);
                return StepOutcome::Rejected;
            }
            n.min((self.last_frame - self.frame) as i32)
        } else if n < 0 {
            if self.at_start() {
                warn!("Attempt to reverse jump from first frame");
                return StepOutcome::Rejected;
            }
            n.max(1 - self.frame as i32)
        } else {
            log::error!("jump_frames: delta is 0");
            return StepOutcome::Rejected;
        };
        self.apply(actual)
    }

    fn apply(&mut self, delta: i32) -> StepOutcome {
        self.frame = (self.frame as i64 + delta as i64) as u32;
        self.last_change = delta;
        trace!("Event {} frame {} (delta {})", self.event_number, self.frame, delta);
        if self.at_start() || self.at_end() {
            StepOutcome::Boundary
        } else {
            StepOutcome::Moved
        }
    }

    /// Undo the last frame change after the new frame failed to load.
    ///
    /// No recorded change means the event's very first image failed, so the
    /// event itself is considered broken. A revert landing outside the event
    /// is refused without touching the frame.
    pub fn revert_last_change(&mut self) -> Result<u32, ViewerError> {
        if self.last_change == 0 {
            return Err(ViewerError::EventCompromised {
                event: self.event_number.clone(),
            });
        }
        let candidate = self.frame as i64 - self.last_change as i64;
        if candidate < 1 || candidate > self.last_frame as i64 {
            return Err(ViewerError::FrameOutOfBounds {
                frame: candidate,
                last_frame: self.last_frame,
            });
        }
        self.frame = candidate as u32;
        Ok(self.frame)
    }
}
