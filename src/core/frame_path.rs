//! Frame path resolution for captured event images.
//!
//! Every event directory holds files named `<frame>-capture.jpg`, where the
//! frame number is zero-padded to the event's "significant digits" width:
//!
//! | digits | frame 7            | frame 42            |
//! |--------|--------------------|---------------------|
//! | 1      | `7-capture.jpg`    | `42-capture.jpg`    |
//! | 2      | `07-capture.jpg`   | `42-capture.jpg`    |
//! | 3      | `007-capture.jpg`  | `042-capture.jpg`   |
//!
//! The naming variant is picked once per event ([`FramePathResolver::new`])
//! and reused for every frame, so the hot path during playback is a single
//! `format!` without re-checking the padding rule.

use enum_dispatch::enum_dispatch;

/// Suffix shared by all captured frame files
pub const CAPTURE_SUFFIX: &str = "-capture.jpg";

/// Builds the file name (without directory) for a frame number.
#[enum_dispatch]
pub trait FrameNaming {
    fn frame_name(&self, frame: u32) -> String;
}

/// `sigdigits == 1`: natural decimal representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unpadded;

/// `sigdigits == 2`: single leading zero below 10
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoDigit;

/// `sigdigits > 2`: leading zeros up to `width`, never truncated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroPadded {
    pub width: usize,
}

impl FrameNaming for Unpadded {
    fn frame_name(&self, frame: u32) -> String {
        format!("{}{}", frame, CAPTURE_SUFFIX)
    }
}

impl FrameNaming for TwoDigit {
    fn frame_name(&self, frame: u32) -> String {
        let prefix = if frame < 10 { "0" } else { "" };
        format!("{}{}{}", prefix, frame, CAPTURE_SUFFIX)
    }
}

impl FrameNaming for ZeroPadded {
    fn frame_name(&self, frame: u32) -> String {
        format!("{:0width$}{}", frame, CAPTURE_SUFFIX, width = self.width)
    }
}

/// Closed set of naming strategies, dispatched statically.
#[enum_dispatch(FrameNaming)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    Unpadded,
    TwoDigit,
    ZeroPadded,
}

impl Naming {
    /// Select the strategy for an event's significant digits.
    /// Zero is treated like 1 (event lists are validated on load anyway).
    pub fn for_digits(significant_digits: u32) -> Self {
        match significant_digits {
            0 | 1 => Unpadded.into(),
            2 => TwoDigit.into(),
            n => ZeroPadded { width: n as usize }.into(),
        }
    }
}

/// Per-event path builder: `root/event/` prefix plus the selected naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePathResolver {
    event_dir: String,
    naming: Naming,
}

impl FramePathResolver {
    pub fn new(root: &str, event_number: &str, significant_digits: u32) -> Self {
        Self {
            event_dir: format!("{}/{}/", root, event_number),
            naming: Naming::for_digits(significant_digits),
        }
    }

    /// Full display path of `frame` within this event
    pub fn path(&self, frame: u32) -> String {
        let mut path = self.event_dir.clone();
        path.push_str(&self.naming.frame_name(frame));
        path
    }
}

/// One-off resolution. Prefer a cached [`FramePathResolver`] for playback.
pub fn resolve_path(root: &str, event_number: &str, frame: u32, significant_digits: u32) -> String {
    FramePathResolver::new(root, event_number, significant_digits).path(frame)
}
