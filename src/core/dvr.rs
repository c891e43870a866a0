//! DVR states, the eight transport controls, and the transition table that
//! decides which controls are usable after each state change.
//!
//! The table is keyed by `(from, to)` and built from a static entry list.
//! [`ControlTable::new`] refuses to build if any legal transition is missing
//! or listed twice, so a gap shows up at startup instead of as a button that
//! silently keeps its old state.

use std::collections::HashMap;
use std::fmt;

use super::viewer::ViewerError;

/// Discrete playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DvrState {
    /// Stopped on frame 1
    Rewound,
    /// Recurring timer active, any direction or speed
    Moving,
    /// Stopped strictly between the first and last frame
    Paused,
    /// Stopped on the last frame
    Ended,
}

impl DvrState {
    /// Every transition the machine may perform
    pub const LEGAL_TRANSITIONS: [(DvrState, DvrState); 10] = [
        (DvrState::Rewound, DvrState::Moving),
        (DvrState::Rewound, DvrState::Paused),
        (DvrState::Moving, DvrState::Paused),
        (DvrState::Moving, DvrState::Ended),
        (DvrState::Moving, DvrState::Rewound),
        (DvrState::Paused, DvrState::Moving),
        (DvrState::Paused, DvrState::Ended),
        (DvrState::Paused, DvrState::Rewound),
        (DvrState::Ended, DvrState::Moving),
        (DvrState::Ended, DvrState::Paused),
    ];

    pub fn is_legal(from: DvrState, to: DvrState) -> bool {
        Self::LEGAL_TRANSITIONS.contains(&(from, to))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DvrState::Rewound => "REWOUND",
            DvrState::Moving => "MOVING",
            DvrState::Paused => "PAUSED",
            DvrState::Ended => "ENDED",
        }
    }
}

impl fmt::Display for DvrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight fixed controls, in on-screen order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    PrevEvent,
    FastReverse,
    StepReverse,
    Pause,
    Play,
    StepForward,
    FastForward,
    NextEvent,
}

impl Control {
    pub const ALL: [Control; 8] = [
        Control::PrevEvent,
        Control::FastReverse,
        Control::StepReverse,
        Control::Pause,
        Control::Play,
        Control::StepForward,
        Control::FastForward,
        Control::NextEvent,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Button glyph
    pub fn label(self) -> &'static str {
        match self {
            Control::PrevEvent => "⏮",
            Control::FastReverse => "⏪",
            Control::StepReverse => "◀|",
            Control::Pause => "⏸",
            Control::Play => "▶",
            Control::StepForward => "|▶",
            Control::FastForward => "⏩",
            Control::NextEvent => "⏭",
        }
    }

    pub fn tooltip(self) -> &'static str {
        match self {
            Control::PrevEvent => "Previous event",
            Control::FastReverse => "Fast reverse",
            Control::StepReverse => "Step back one frame",
            Control::Pause => "Pause",
            Control::Play => "Play",
            Control::StepForward => "Step forward one frame",
            Control::FastForward => "Fast forward",
            Control::NextEvent => "Next event",
        }
    }
}

/// Desired status of one control after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
    /// Left as is; the operation performing the transition decides
    Keep,
}

/// Resulting enabled-set of all eight controls.
///
/// Event navigation (prev/next) depends on the event index, not on the DVR
/// state, so the transport sets leave it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSet([Toggle; 8]);

impl ControlSet {
    /// Transport set: fast-reverse, step-reverse, pause, play, step-forward, fast-forward
    pub const fn transport(
        fast_reverse: Toggle,
        step_reverse: Toggle,
        pause: Toggle,
        play: Toggle,
        step_forward: Toggle,
        fast_forward: Toggle,
    ) -> Self {
        Self([
            Toggle::Keep,
            fast_reverse,
            step_reverse,
            pause,
            play,
            step_forward,
            fast_forward,
            Toggle::Keep,
        ])
    }

    pub fn get(&self, control: Control) -> Toggle {
        self.0[control.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Control, Toggle)> + '_ {
        Control::ALL.iter().map(move |c| (*c, self.0[c.index()]))
    }
}

use Toggle::{Keep, Off, On};

/// At frame 1: nothing to rewind, nothing to pause
pub const REWOUND_SET: ControlSet = ControlSet::transport(Off, Off, Off, On, On, On);
/// Timer running: only pause, direction/speed changes (play decided by caller)
pub const MOVING_SET: ControlSet = ControlSet::transport(On, Off, On, Keep, Off, On);
/// Stopped mid-event: everything but pause
pub const PAUSED_SET: ControlSet = ControlSet::transport(On, On, Off, On, On, On);
/// At the last frame: only backwards
pub const ENDED_SET: ControlSet = ControlSet::transport(On, On, Off, Off, Off, Off);

/// Static transition entries
pub const TRANSITIONS: &[(DvrState, DvrState, ControlSet)] = &[
    (DvrState::Rewound, DvrState::Moving, MOVING_SET),
    // only reachable by stepping the first frame
    (DvrState::Rewound, DvrState::Paused, PAUSED_SET),
    (DvrState::Moving, DvrState::Paused, PAUSED_SET),
    (DvrState::Moving, DvrState::Ended, ENDED_SET),
    (DvrState::Moving, DvrState::Rewound, REWOUND_SET),
    (DvrState::Paused, DvrState::Moving, MOVING_SET),
    (DvrState::Paused, DvrState::Ended, ENDED_SET),
    (DvrState::Paused, DvrState::Rewound, REWOUND_SET),
    (DvrState::Ended, DvrState::Moving, MOVING_SET),
    // only reachable by stepping back from the last frame
    (DvrState::Ended, DvrState::Paused, PAUSED_SET),
];

/// Validated `(from, to) -> ControlSet` mapping
#[derive(Debug, Clone)]
pub struct ControlTable {
    transitions: HashMap<(DvrState, DvrState), ControlSet>,
}

impl ControlTable {
    /// Build from the static entries
    pub fn new() -> Result<Self, ViewerError> {
        Self::from_entries(TRANSITIONS)
    }

    /// Build from arbitrary entries, failing on duplicates, illegal pairs or gaps
    pub fn from_entries(entries: &[(DvrState, DvrState, ControlSet)]) -> Result<Self, ViewerError> {
        let mut transitions = HashMap::with_capacity(entries.len());
        for &(from, to, set) in entries {
            if !DvrState::is_legal(from, to) {
                return Err(ViewerError::IllegalTransition { from, to });
            }
            if transitions.insert((from, to), set).is_some() {
                return Err(ViewerError::DuplicateTransition { from, to });
            }
        }
        for (from, to) in DvrState::LEGAL_TRANSITIONS {
            if !transitions.contains_key(&(from, to)) {
                return Err(ViewerError::MissingTransition { from, to });
            }
        }
        Ok(Self { transitions })
    }

    pub fn get(&self, from: DvrState, to: DvrState) -> Option<&ControlSet> {
        self.transitions.get(&(from, to))
    }

    /// Set applied when an event is (re)loaded. Only REWOUND and ENDED are entry states.
    pub fn entry(&self, state: DvrState) -> Option<&'static ControlSet> {
        match state {
            DvrState::Rewound => Some(&REWOUND_SET),
            DvrState::Ended => Some(&ENDED_SET),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
