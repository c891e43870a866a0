//! Playback state machine for browsing captured events frame by frame.
//!
//! **Ownership**: the viewer owns the event list, the display surface, the
//! control surface and the current [`PlaybackSession`]. A new session is built
//! each time the current event changes; speed is carried across.
//!
//! **Timers**: nothing runs by itself. The host calls [`Viewer::update`] with
//! the current instant (every UI frame); due timers fire from there. Every
//! accepted operation cancels both timers before it changes anything, so at
//! most one recurring loop and one deferred resume exist at any time.
//!
//! **Rejections**: invalid operations are logged once (warn for user-level
//! misuse, error for logic errors) and returned as `Err`; nothing is mutated.
//!
//! # Speed rules
//!
//! - `play()`: always +1
//! - `fast_forward()`: doubles while moving forward, +2 when switching
//!   direction or starting from rest (a paused fast-forward speed resumes)
//! - `fast_reverse()`: mirror image with negative speeds
//!
//! # Event changes
//!
//! `next_event()`/`prev_event()` keep the user's motion going: normal play
//! restarts with `play()`; fast motion resumes one tick later by stepping
//! off the entry frame and re-entering fast motion at the carried speed.

use log::{debug, info, log, trace, warn, Level};
use std::fmt;
use std::time::{Duration, Instant};

use super::controls::ControlSurface;
use super::display::FrameDisplay;
use super::dvr::{Control, ControlTable, DvrState};
use super::event_bus::{EventBus, EventEmitter};
use super::session::{PlaybackSession, StepOutcome};
use super::timers::{Motion, Resume, Timers};
use super::viewer_events::EventChangedEvent;
use crate::config::ViewerSettings;
use crate::entities::EventList;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// Operation not valid in the current state
    Rejected(&'static str),
    /// Trigger of a control that is currently disabled
    ControlDisabled(Control),
    /// Operation before any event was loaded
    NoActiveEvent,
    IndexOutOfRange { index: usize, len: usize },
    /// Pause without a running timer
    NothingRunning,
    ZeroDelta,
    UnimplementedTransition { from: DvrState, to: DvrState },
    IllegalTransition { from: DvrState, to: DvrState },
    DuplicateTransition { from: DvrState, to: DvrState },
    MissingTransition { from: DvrState, to: DvrState },
    /// First image of the event failed; its frame data is incomplete or unreachable
    EventCompromised { event: String },
    FrameOutOfBounds { frame: i64, last_frame: u32 },
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Rejected(what) => write!(f, "{}", what),
            ViewerError::ControlDisabled(c) => write!(f, "{} is disabled", c.tooltip()),
            ViewerError::NoActiveEvent => write!(f, "No event loaded"),
            ViewerError::IndexOutOfRange { index, len } => {
                write!(f, "Event index {} is out of bounds ({} events)", index, len)
            }
            ViewerError::NothingRunning => write!(f, "Pause while nothing is running"),
            ViewerError::ZeroDelta => write!(f, "jump_frames: delta is 0"),
            ViewerError::UnimplementedTransition { from, to } => {
                write!(f, "Transition {} -> {} is unimplemented", from, to)
            }
            ViewerError::IllegalTransition { from, to } => {
                write!(f, "Transition table lists illegal pair {} -> {}", from, to)
            }
            ViewerError::DuplicateTransition { from, to } => {
                write!(f, "Transition table lists {} -> {} twice", from, to)
            }
            ViewerError::MissingTransition { from, to } => {
                write!(f, "Transition table has no entry for {} -> {}", from, to)
            }
            ViewerError::EventCompromised { event } => {
                write!(f, "Event dir {} seems to be compromised", event)
            }
            ViewerError::FrameOutOfBounds { frame, last_frame } => {
                write!(f, "Frame {} is out of bounds (1..={})", frame, last_frame)
            }
        }
    }
}

impl std::error::Error for ViewerError {}

impl ViewerError {
    /// Invalid operations are warnings, everything else is an error
    pub fn level(&self) -> Level {
        match self {
            ViewerError::Rejected(_) | ViewerError::ControlDisabled(_) => Level::Warn,
            _ => Level::Error,
        }
    }

    /// Log at the error's own level and hand it back
    pub fn logged(self) -> Self {
        log!(self.level(), "{}", self);
        self
    }
}

/// Snapshot of the fields most operations validate against
#[derive(Debug, Clone, Copy)]
struct Position {
    index: usize,
    state: DvrState,
    frame: u32,
    last_frame: u32,
    speed: i32,
}

pub struct Viewer<D: FrameDisplay> {
    events: EventList,
    display: D,
    controls: ControlSurface,
    table: ControlTable,
    timers: Timers,
    session: Option<PlaybackSession>,
    max_speed: i32,
    emitter: EventEmitter,
    /// Last instant passed to `update`; timers are scheduled relative to it
    now: Instant,
}

impl<D: FrameDisplay> Viewer<D> {
    /// Bind display and bus, validate the control table, start with every control disabled.
    pub fn new(
        events: EventList,
        display: D,
        settings: &ViewerSettings,
        bus: &EventBus,
    ) -> Result<Self, ViewerError> {
        let table = ControlTable::new().map_err(ViewerError::logged)?;
        info!(
            "Viewer initialized: {} events under {} ({:.0} fps)",
            events.len(),
            events.root,
            settings.fps
        );
        Ok(Self {
            events,
            display,
            controls: ControlSurface::disabled(),
            table,
            timers: Timers::new(settings.frame_period()),
            session: None,
            max_speed: settings.max_speed.max(2),
            emitter: bus.emitter(),
            now: Instant::now(),
        })
    }

    /// Register a listener called with `(index, in_reverse)` after every event load.
    pub fn on_event_changed<F>(&self, listener: F)
    where
        F: Fn(usize, bool) + Send + Sync + 'static,
    {
        self.emitter
            .subscribe::<EventChangedEvent, _>(move |e| listener(e.index, e.in_reverse));
    }

    // === Accessors ===

    pub fn events(&self) -> &EventList {
        &self.events
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> Option<DvrState> {
        self.session.as_ref().map(|s| s.state)
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn period(&self) -> Duration {
        self.timers.recurring.period()
    }

    /// When the host should call `update` next, if anything is scheduled
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.next_due()
    }

    // === Entry points ===

    /// Load the event at `index` and start normal playback.
    pub fn play_event(&mut self, index: usize) -> Result<(), ViewerError> {
        self.load_event(index, false)?;
        self.play()
    }

    /// Dispatch a button press, refusing disabled controls.
    pub fn trigger(&mut self, control: Control) -> Result<(), ViewerError> {
        if !self.controls.is_enabled(control) {
            return Err(ViewerError::ControlDisabled(control).logged());
        }
        match control {
            Control::PrevEvent => self.prev_event(),
            Control::FastReverse => self.fast_reverse(),
            Control::StepReverse => self.step_reverse(),
            Control::Pause => self.pause(),
            Control::Play => self.play(),
            Control::StepForward => self.step_forward(),
            Control::FastForward => self.fast_forward(),
            Control::NextEvent => self.next_event(),
        }
    }

    /// Pause if a loop is running, play otherwise
    pub fn toggle_pause(&mut self) -> Result<(), ViewerError> {
        if self.timers.recurring.is_active() {
            self.trigger(Control::Pause)
        } else {
            self.trigger(Control::Play)
        }
    }

    /// Fire due timers. At most one deferred resume and one recurring tick per call.
    pub fn update(&mut self, now: Instant) {
        self.now = now;
        if let Some(resume) = self.timers.deferred.poll(now) {
            // rejections are already logged
            let _ = self.resume(resume);
        }
        if let Some(motion) = self.timers.recurring.poll(now) {
            self.run_motion(motion);
        }
    }

    // === Transport ===

    pub fn play(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        if pos.state != DvrState::Moving && pos.frame == pos.last_frame {
            return Err(ViewerError::Rejected("play: already at the last frame").logged());
        }
        self.timers.abort();
        self.set_speed(1);
        self.timers.recurring.start(Motion { delta: 1 }, self.now);
        self.change_state(DvrState::Moving)?;
        self.controls.set_enabled(Control::Play, false);
        debug!("Play from frame {}", pos.frame);
        Ok(())
    }

    pub fn fast_forward(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        let moving = pos.state == DvrState::Moving;
        if !moving && pos.frame == pos.last_frame {
            return Err(ViewerError::Rejected("fast_forward: already at the last frame").logged());
        }
        self.timers.abort();
        let speed = if moving && pos.speed > 0 {
            pos.speed.saturating_mul(2).min(self.max_speed)
        } else if !moving && pos.speed > 1 {
            pos.speed
        } else {
            2
        };
        self.start_fast_motion(speed)
    }

    pub fn fast_reverse(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        let moving = pos.state == DvrState::Moving;
        if !moving && pos.frame == 1 {
            return Err(ViewerError::Rejected("fast_reverse: already at the first frame").logged());
        }
        self.timers.abort();
        let speed = if moving && pos.speed < 0 {
            pos.speed.saturating_mul(2).max(-self.max_speed)
        } else if !moving && pos.speed < -1 {
            pos.speed
        } else {
            -2
        };
        self.start_fast_motion(speed)
    }

    fn start_fast_motion(&mut self, speed: i32) -> Result<(), ViewerError> {
        self.set_speed(speed);
        self.timers.recurring.start(Motion { delta: speed }, self.now);
        self.change_state(DvrState::Moving)?;
        // back to 1x is always possible while fast
        self.controls.set_enabled(Control::Play, true);
        debug!("Fast motion at {}x", speed);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), ViewerError> {
        self.position()?;
        if !self.timers.recurring.is_active() {
            return Err(ViewerError::NothingRunning.logged());
        }
        self.timers.abort();
        self.settle()
    }

    pub fn step_forward(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        if pos.frame == pos.last_frame {
            return Err(ViewerError::Rejected("step_forward: already at the last frame").logged());
        }
        self.timers.abort();
        let outcome = self.move_frame(|s| s.next_frame());
        let to = if outcome == StepOutcome::Boundary {
            DvrState::Ended
        } else {
            DvrState::Paused
        };
        self.change_state(to)
    }

    pub fn step_reverse(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        if pos.frame == 1 {
            return Err(ViewerError::Rejected("step_reverse: already at the first frame").logged());
        }
        self.timers.abort();
        let outcome = self.move_frame(|s| s.prev_frame());
        let to = if outcome == StepOutcome::Boundary {
            DvrState::Rewound
        } else {
            DvrState::Paused
        };
        self.change_state(to)
    }

    /// Move by a raw delta, clamped to the event; stops any motion.
    pub fn jump_frames(&mut self, n: i32) -> Result<StepOutcome, ViewerError> {
        let pos = self.position()?;
        if n == 0 {
            return Err(ViewerError::ZeroDelta.logged());
        }
        if (n > 0 && pos.frame == pos.last_frame) || (n < 0 && pos.frame == 1) {
            return Err(ViewerError::Rejected("jump_frames: already at the boundary").logged());
        }
        self.timers.abort();
        let outcome = self.move_frame(|s| s.jump_frames(n));
        self.settle()?;
        Ok(outcome)
    }

    // === Event navigation ===

    pub fn next_event(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        if pos.index + 1 >= self.events.len() {
            return Err(ViewerError::Rejected("next_event: already at the last event").logged());
        }
        self.timers.abort();
        self.load_event(pos.index + 1, false)?;
        // reverse motion falls back to forward play in the next event
        if pos.speed > 1 {
            self.timers.deferred.start(Resume::FastForward, self.now);
            Ok(())
        } else {
            self.play()
        }
    }

    pub fn prev_event(&mut self) -> Result<(), ViewerError> {
        let pos = self.position()?;
        if pos.index == 0 {
            return Err(ViewerError::Rejected("prev_event: already at the first event").logged());
        }
        self.timers.abort();
        if pos.speed < 0 {
            // continue reversing from the end of the previous event
            self.load_event(pos.index - 1, true)?;
            self.timers.deferred.start(Resume::FastReverse, self.now);
            return Ok(());
        }
        self.load_event(pos.index - 1, false)?;
        if pos.speed > 1 {
            self.timers.deferred.start(Resume::FastForward, self.now);
            Ok(())
        } else {
            self.play()
        }
    }

    /// Make `index` the current event: frame 1 (REWOUND), or the last frame
    /// (ENDED) when `in_reverse`. Cancels timers and notifies listeners.
    pub fn load_event(&mut self, index: usize, in_reverse: bool) -> Result<(), ViewerError> {
        let len = self.events.len();
        let Some(event) = self.events.get(index) else {
            return Err(ViewerError::IndexOutOfRange { index, len }.logged());
        };
        self.timers.abort();
        let speed = self.session.as_ref().map_or(1, |s| s.speed);
        let session = PlaybackSession::new(index, event, &self.events.root, in_reverse, speed);
        let entry = session.state;

        self.controls.set_event_number(&session.event_number);
        self.controls.set_speed(session.speed);
        self.session = Some(session);
        match self.table.entry(entry) {
            Some(set) => self.controls.apply(set),
            None => return Err(ViewerError::UnimplementedTransition { from: entry, to: entry }.logged()),
        }
        if self.session.as_ref().is_some_and(|s| s.last_frame == 1) {
            // nowhere to move inside a single-frame event
            for control in Control::ALL {
                if !matches!(control, Control::PrevEvent | Control::NextEvent) {
                    self.controls.set_enabled(control, false);
                }
            }
        }
        self.controls.set_enabled(Control::PrevEvent, index != 0);
        self.controls.set_enabled(Control::NextEvent, index + 1 < len);
        self.show_frame();

        info!(
            "Event {} loaded (index {}/{}, {} frames, entry {})",
            self.controls.status.event_number,
            index,
            len,
            self.session.as_ref().map_or(0, |s| s.last_frame),
            entry
        );
        self.emitter.emit(EventChangedEvent { index, in_reverse });
        Ok(())
    }

    // === Load failure ===

    /// The displayed image failed to load: stop, and go back to the last good frame.
    ///
    /// Returns the frame now shown. Without a recorded change (first image of
    /// the event) or when the revert would leave the event, the event is
    /// reported as broken and nothing else changes.
    pub fn handle_load_failure(&mut self) -> Result<u32, ViewerError> {
        self.timers.abort();
        warn!(
            "Could not load image \"{}\"",
            self.display.source().unwrap_or_default()
        );
        let Some(session) = self.session.as_mut() else {
            return Err(ViewerError::NoActiveEvent.logged());
        };
        let frame = session.revert_last_change().map_err(ViewerError::logged)?;
        self.show_frame();
        // the failed frame may have been an end frame, or a loop was running
        self.settle()?;
        info!("Reverted to frame {} after load failure", frame);
        Ok(frame)
    }

    // === Internals ===

    fn position(&self) -> Result<Position, ViewerError> {
        self.session
            .as_ref()
            .map(|s| Position {
                index: s.event_index,
                state: s.state,
                frame: s.frame,
                last_frame: s.last_frame,
                speed: s.speed,
            })
            .ok_or_else(|| ViewerError::NoActiveEvent.logged())
    }

    fn resume(&mut self, resume: Resume) -> Result<(), ViewerError> {
        debug!("Resuming {:?} in new event", resume);
        match resume {
            Resume::FastForward => {
                self.step_forward()?;
                self.fast_forward()
            }
            Resume::FastReverse => {
                self.step_reverse()?;
                self.fast_reverse()
            }
        }
    }

    /// One recurring tick
    fn run_motion(&mut self, motion: Motion) {
        let outcome = self.move_frame(|s| s.jump_frames(motion.delta));
        if outcome.keeps_moving() {
            return;
        }
        self.timers.recurring.cancel();
        trace!("Motion {:?} stopped ({:?})", motion, outcome);
        let _ = self.change_state(motion.terminal_state());
    }

    fn move_frame(&mut self, step: impl FnOnce(&mut PlaybackSession) -> StepOutcome) -> StepOutcome {
        let Some(session) = self.session.as_mut() else {
            return StepOutcome::Rejected;
        };
        let outcome = step(session);
        if outcome.changed_frame() {
            self.show_frame();
        }
        outcome
    }

    /// Enter the resting state for the current frame
    fn settle(&mut self) -> Result<(), ViewerError> {
        match self.session.as_ref().map(|s| s.resting_state()) {
            Some(to) => self.change_state(to),
            None => Err(ViewerError::NoActiveEvent.logged()),
        }
    }

    fn change_state(&mut self, to: DvrState) -> Result<(), ViewerError> {
        let Some(from) = self.state() else {
            return Err(ViewerError::NoActiveEvent.logged());
        };
        if from == to {
            return Ok(());
        }
        // stepping across a two-frame event
        if matches!(
            (from, to),
            (DvrState::Rewound, DvrState::Ended) | (DvrState::Ended, DvrState::Rewound)
        ) {
            self.change_state(DvrState::Paused)?;
            return self.change_state(to);
        }
        let Some(set) = self.table.get(from, to).copied() else {
            return Err(ViewerError::UnimplementedTransition { from, to }.logged());
        };
        self.controls.apply(&set);
        if let Some(session) = self.session.as_mut() {
            session.state = to;
        }
        debug!("DVR {} -> {}", from, to);
        Ok(())
    }

    fn set_speed(&mut self, speed: i32) {
        if let Some(session) = self.session.as_mut() {
            session.speed = speed;
        }
        self.controls.set_speed(speed);
    }

    fn show_frame(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let path = session.path();
        let frame = session.frame;
        self.display.set_source(&path);
        self.controls.set_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Event;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingDisplay {
        sources: Vec<String>,
    }

    impl FrameDisplay for RecordingDisplay {
        fn set_source(&mut self, path: &str) {
            self.sources.push(path.to_string());
        }

        fn source(&self) -> Option<&str> {
            self.sources.last().map(|s| s.as_str())
        }
    }

    fn events(frames: &[u32]) -> EventList {
        let list = frames
            .iter()
            .enumerate()
            .map(|(i, n)| Event::new(i.to_string(), *n, 2))
            .collect();
        EventList::new("/zm", "2014-09-12T18:04:33", list)
    }

    fn viewer(frames: &[u32]) -> Viewer<RecordingDisplay> {
        viewer_with(frames, &ViewerSettings::default())
    }

    fn viewer_with(frames: &[u32], settings: &ViewerSettings) -> Viewer<RecordingDisplay> {
        Viewer::new(events(frames), RecordingDisplay::default(), settings, &EventBus::new()).unwrap()
    }

    fn tick(v: &mut Viewer<RecordingDisplay>) {
        let at = v.now() + v.period();
        v.update(at);
    }

    fn frame(v: &Viewer<RecordingDisplay>) -> u32 {
        v.session().map(|s| s.frame).unwrap()
    }

    fn speed(v: &Viewer<RecordingDisplay>) -> i32 {
        v.session().map(|s| s.speed).unwrap()
    }

    fn source(v: &Viewer<RecordingDisplay>) -> &str {
        v.display().source().unwrap()
    }

    #[test]
    fn test_initial_state() {
        let mut v = viewer(&[5]);
        assert!(v.controls().enabled_controls().is_empty());
        assert!(v.session().is_none());
        assert_eq!(v.play(), Err(ViewerError::NoActiveEvent));
        assert_eq!(v.pause(), Err(ViewerError::NoActiveEvent));
        assert!(v.display().source().is_none());
    }

    #[test]
    fn test_play_event_runs_to_end() {
        let mut v = viewer(&[5, 3]);
        v.play_event(0).unwrap();
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert_eq!(source(&v), "/zm/0/01-capture.jpg");
        assert!(!v.controls().is_enabled(Control::Play));
        assert!(v.controls().is_enabled(Control::Pause));
        assert!(!v.controls().is_enabled(Control::PrevEvent));
        assert!(v.controls().is_enabled(Control::NextEvent));

        for expected in 2..=4 {
            tick(&mut v);
            assert_eq!(frame(&v), expected);
            assert_eq!(v.state(), Some(DvrState::Moving));
        }
        tick(&mut v);
        assert_eq!(frame(&v), 5);
        assert_eq!(v.state(), Some(DvrState::Ended));
        assert_eq!(source(&v), "/zm/0/05-capture.jpg");
        assert!(v.timers().is_idle());

        let shown = v.display().sources.len();
        tick(&mut v);
        assert_eq!(v.display().sources.len(), shown);
        assert_eq!(
            v.controls().enabled_controls(),
            vec![Control::FastReverse, Control::StepReverse, Control::NextEvent]
        );
    }

    #[test]
    fn test_stepping_through_states() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        assert_eq!(v.state(), Some(DvrState::Rewound));
        assert_eq!(v.step_reverse(), Err(ViewerError::Rejected("step_reverse: already at the first frame")));

        v.step_forward().unwrap();
        assert_eq!((frame(&v), v.state()), (2, Some(DvrState::Paused)));
        assert!(v.controls().is_enabled(Control::StepReverse));
        v.step_forward().unwrap();
        v.step_forward().unwrap();
        assert_eq!((frame(&v), v.state()), (4, Some(DvrState::Paused)));
        v.step_forward().unwrap();
        assert_eq!((frame(&v), v.state()), (5, Some(DvrState::Ended)));
        assert!(v.step_forward().is_err());
        assert_eq!(frame(&v), 5);

        v.step_reverse().unwrap();
        assert_eq!((frame(&v), v.state()), (4, Some(DvrState::Paused)));
        assert!(v.controls().is_enabled(Control::Play));
        assert!(v.timers().is_idle());
    }

    #[test]
    fn test_two_frame_event_steps_across() {
        let mut v = viewer(&[2]);
        v.load_event(0, false).unwrap();
        v.step_forward().unwrap();
        assert_eq!(v.state(), Some(DvrState::Ended));
        assert!(!v.controls().is_enabled(Control::StepForward));
        v.step_reverse().unwrap();
        assert_eq!(v.state(), Some(DvrState::Rewound));
        assert!(!v.controls().is_enabled(Control::StepReverse));
    }

    #[test]
    fn test_jump_clamps_and_reports_boundary() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        assert_eq!(v.jump_frames(2), Ok(StepOutcome::Moved));
        assert_eq!(v.state(), Some(DvrState::Paused));
        assert_eq!(v.jump_frames(100), Ok(StepOutcome::Boundary));
        assert_eq!((frame(&v), v.state()), (5, Some(DvrState::Ended)));
        assert_eq!(v.session().unwrap().last_change, 2);
        assert_eq!(v.jump_frames(0), Err(ViewerError::ZeroDelta));
        assert!(v.jump_frames(1).is_err());
        assert_eq!(v.jump_frames(-9), Ok(StepOutcome::Boundary));
        assert_eq!((frame(&v), v.state()), (1, Some(DvrState::Rewound)));
    }

    #[test]
    fn test_next_event_rejected_at_last_index() {
        let mut v = viewer(&[5, 3]);
        v.load_event(1, false).unwrap();
        let shown = v.display().sources.len();
        let controls = v.controls().clone();

        assert!(matches!(v.next_event(), Err(ViewerError::Rejected(_))));
        assert_eq!(v.session().unwrap().event_index, 1);
        assert_eq!(frame(&v), 1);
        assert!(v.timers().is_idle());
        assert_eq!(v.display().sources.len(), shown);
        assert_eq!(v.controls(), &controls);
    }

    #[test]
    fn test_pause_without_timer_is_rejected() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        let controls = v.controls().clone();
        assert_eq!(v.pause(), Err(ViewerError::NothingRunning));
        assert_eq!(v.controls(), &controls);
        assert_eq!(v.state(), Some(DvrState::Rewound));
    }

    #[test]
    fn test_pause_mid_play() {
        let mut v = viewer(&[5]);
        v.play_event(0).unwrap();
        tick(&mut v);
        v.pause().unwrap();
        assert_eq!((frame(&v), v.state()), (2, Some(DvrState::Paused)));
        assert!(v.timers().is_idle());
        assert!(v.controls().is_enabled(Control::Play));
        assert!(!v.controls().is_enabled(Control::Pause));

        // pausing before the first tick rests on frame 1
        v.play().unwrap();
        v.jump_frames(-1).unwrap();
        v.play().unwrap();
        v.pause().unwrap();
        assert_eq!(v.state(), Some(DvrState::Rewound));
    }

    #[test]
    fn test_load_failure_reverts_last_change() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        v.step_forward().unwrap();
        v.step_forward().unwrap();
        assert_eq!(frame(&v), 3);
        assert_eq!(v.session().unwrap().last_change, 1);

        assert_eq!(v.handle_load_failure(), Ok(2));
        assert_eq!(frame(&v), 2);
        assert_eq!(source(&v), "/zm/0/02-capture.jpg");
        assert_eq!(v.controls().status.frame, "2");
    }

    #[test]
    fn test_load_failure_on_first_image() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        let shown = v.display().sources.len();
        assert_eq!(
            v.handle_load_failure(),
            Err(ViewerError::EventCompromised { event: "0".into() })
        );
        assert_eq!(frame(&v), 1);
        assert_eq!(v.display().sources.len(), shown);
    }

    #[test]
    fn test_load_failure_while_playing_settles() {
        let mut v = viewer(&[5]);
        v.play_event(0).unwrap();
        tick(&mut v);
        tick(&mut v);
        assert_eq!(frame(&v), 3);

        assert_eq!(v.handle_load_failure(), Ok(2));
        assert!(v.timers().is_idle());
        assert_eq!(v.state(), Some(DvrState::Paused));
        assert!(v.controls().is_enabled(Control::Play));
        assert!(!v.controls().is_enabled(Control::Pause));
    }

    #[test]
    fn test_load_failure_after_step_to_end_settles() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        for _ in 0..4 {
            v.step_forward().unwrap();
        }
        assert_eq!(v.state(), Some(DvrState::Ended));

        assert_eq!(v.handle_load_failure(), Ok(4));
        assert_eq!(v.state(), Some(DvrState::Paused));
        assert_eq!(v.state(), v.session().map(|s| s.resting_state()));
        assert!(v.controls().is_enabled(Control::StepForward));
        assert!(v.controls().is_enabled(Control::Play));
        v.step_forward().unwrap();
        assert_eq!((frame(&v), v.state()), (5, Some(DvrState::Ended)));
    }

    #[test]
    fn test_load_failure_after_step_to_start_settles() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        v.step_forward().unwrap();
        v.step_reverse().unwrap();
        assert_eq!(v.state(), Some(DvrState::Rewound));

        assert_eq!(v.handle_load_failure(), Ok(2));
        assert_eq!((frame(&v), v.state()), (2, Some(DvrState::Paused)));
        assert!(v.controls().is_enabled(Control::StepReverse));
        assert!(v.controls().is_enabled(Control::FastReverse));
    }

    #[test]
    fn test_load_failure_reverting_onto_an_end_frame() {
        let mut v = viewer(&[5]);
        v.load_event(0, false).unwrap();
        v.step_forward().unwrap();
        assert_eq!(v.handle_load_failure(), Ok(1));
        assert_eq!(v.state(), Some(DvrState::Rewound));
        assert!(!v.controls().is_enabled(Control::StepReverse));

        let mut v = viewer(&[2]);
        v.load_event(0, false).unwrap();
        v.step_forward().unwrap();
        v.step_reverse().unwrap();
        assert_eq!(v.handle_load_failure(), Ok(2));
        assert_eq!(v.state(), Some(DvrState::Ended));
    }

    #[test]
    fn test_fast_speed_rules() {
        let settings = ViewerSettings {
            max_speed: 8,
            ..ViewerSettings::default()
        };
        let mut v = viewer_with(&[500], &settings);
        v.load_event(0, false).unwrap();

        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 2);
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert!(v.controls().is_enabled(Control::Play));
        assert!(v.controls().is_enabled(Control::FastReverse));
        v.fast_forward().unwrap();
        v.fast_forward().unwrap();
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 8);
        assert_eq!(v.controls().status.speed, "8");

        tick(&mut v);
        assert_eq!(frame(&v), 9);

        v.fast_reverse().unwrap();
        assert_eq!(speed(&v), -2);
        v.fast_reverse().unwrap();
        assert_eq!(speed(&v), -4);
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 2);
        v.play().unwrap();
        assert_eq!(speed(&v), 1);
        assert!(!v.controls().is_enabled(Control::Play));
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 2);
        assert!(v.controls().is_enabled(Control::Play));
    }

    #[test]
    fn test_paused_fast_speed_resumes() {
        let mut v = viewer(&[500]);
        v.load_event(0, false).unwrap();
        v.fast_forward().unwrap();
        v.fast_forward().unwrap();
        tick(&mut v);
        v.pause().unwrap();
        assert_eq!(v.state(), Some(DvrState::Paused));
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 4);

        v.pause().unwrap();
        v.play().unwrap();
        v.pause().unwrap();
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 2);
    }

    #[test]
    fn test_fast_reverse_from_end() {
        let mut v = viewer(&[5]);
        v.load_event(0, true).unwrap();
        assert_eq!((frame(&v), v.state()), (5, Some(DvrState::Ended)));
        assert!(v.fast_forward().is_err());

        v.fast_reverse().unwrap();
        assert_eq!(speed(&v), -2);
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert!(!v.controls().is_enabled(Control::StepReverse));
        assert!(v.controls().is_enabled(Control::FastForward));
        tick(&mut v);
        assert_eq!(frame(&v), 3);
        tick(&mut v);
        assert_eq!((frame(&v), v.state()), (1, Some(DvrState::Rewound)));
        assert!(v.timers().is_idle());
        assert_eq!(
            v.controls().enabled_controls(),
            vec![Control::Play, Control::StepForward, Control::FastForward]
        );
    }

    #[test]
    fn test_prev_event_while_reversing() {
        let bus = EventBus::new();
        let mut v = Viewer::new(
            events(&[5, 10]),
            RecordingDisplay::default(),
            &ViewerSettings::default(),
            &bus,
        )
        .unwrap();
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        v.on_event_changed(move |index, in_reverse| {
            sink.lock().unwrap().push((index, in_reverse));
        });

        v.load_event(1, false).unwrap();
        v.jump_frames(5).unwrap();
        v.fast_reverse().unwrap();
        v.fast_reverse().unwrap();
        assert_eq!(speed(&v), -4);

        v.prev_event().unwrap();
        assert_eq!(v.session().unwrap().event_index, 0);
        assert_eq!((frame(&v), v.state()), (5, Some(DvrState::Ended)));
        assert_eq!(source(&v), "/zm/0/05-capture.jpg");
        assert!(v.timers().deferred.is_active());
        assert!(!v.timers().recurring.is_active());
        assert!(!v.controls().is_enabled(Control::PrevEvent));

        tick(&mut v);
        assert_eq!(frame(&v), 4);
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert_eq!(speed(&v), -4);
        tick(&mut v);
        assert_eq!((frame(&v), v.state()), (1, Some(DvrState::Rewound)));

        assert_eq!(*changes.lock().unwrap(), vec![(1, false), (0, true)]);
        assert_eq!(bus.poll().len(), 2);
    }

    #[test]
    fn test_next_event_while_fast_forwarding() {
        let mut v = viewer(&[10, 10]);
        v.load_event(0, false).unwrap();
        v.fast_forward().unwrap();
        v.fast_forward().unwrap();
        assert_eq!(speed(&v), 4);

        v.next_event().unwrap();
        assert_eq!(v.session().unwrap().event_index, 1);
        assert_eq!(v.state(), Some(DvrState::Rewound));
        assert!(v.timers().deferred.is_active());

        tick(&mut v);
        assert_eq!(frame(&v), 2);
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert_eq!(speed(&v), 4);
        assert!(v.controls().is_enabled(Control::PrevEvent));
        assert!(!v.controls().is_enabled(Control::NextEvent));
    }

    #[test]
    fn test_next_event_while_reversing_plays_forward() {
        let mut v = viewer(&[5, 5]);
        v.load_event(0, true).unwrap();
        v.fast_reverse().unwrap();
        v.next_event().unwrap();
        assert_eq!(v.session().unwrap().event_index, 1);
        assert_eq!(v.state(), Some(DvrState::Moving));
        assert_eq!(speed(&v), 1);
        assert!(v.timers().deferred.context().is_none());
        assert!(!v.controls().is_enabled(Control::Play));
    }

    #[test]
    fn test_prev_event_at_normal_speed_plays() {
        let mut v = viewer(&[5, 5]);
        v.play_event(1).unwrap();
        v.prev_event().unwrap();
        assert_eq!(v.session().unwrap().event_index, 0);
        assert_eq!((frame(&v), v.state()), (1, Some(DvrState::Moving)));
        assert!(matches!(v.prev_event(), Err(ViewerError::Rejected(_))));
    }

    #[test]
    fn test_trigger_respects_enablement() {
        let mut v = viewer(&[5, 5]);
        v.load_event(0, false).unwrap();
        assert_eq!(
            v.trigger(Control::Pause),
            Err(ViewerError::ControlDisabled(Control::Pause))
        );
        assert_eq!(
            v.trigger(Control::PrevEvent),
            Err(ViewerError::ControlDisabled(Control::PrevEvent))
        );
        v.trigger(Control::Play).unwrap();
        assert_eq!(v.state(), Some(DvrState::Moving));
        v.toggle_pause().unwrap();
        assert_eq!(v.state(), Some(DvrState::Rewound));
        v.toggle_pause().unwrap();
        assert_eq!(v.state(), Some(DvrState::Moving));
    }

    #[test]
    fn test_play_event_out_of_range() {
        let mut v = viewer(&[5, 5]);
        assert_eq!(
            v.play_event(5),
            Err(ViewerError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert!(v.session().is_none());
        assert!(v.display().source().is_none());
    }

    #[test]
    fn test_single_frame_event() {
        let mut v = viewer(&[1, 3]);
        v.load_event(0, false).unwrap();
        assert_eq!(v.controls().enabled_controls(), vec![Control::NextEvent]);
        v.load_event(0, true).unwrap();
        assert_eq!(v.controls().enabled_controls(), vec![Control::NextEvent]);
        assert!(v.play_event(0).is_err());
        assert_eq!(v.state(), Some(DvrState::Rewound));
        assert!(v.step_forward().is_err());
        assert!(v.fast_reverse().is_err());
        assert!(v.timers().is_idle());
    }

    #[test]
    fn test_invariants_hold_across_triggers() {
        let mut v = viewer(&[7, 3, 12]);
        v.play_event(0).unwrap();
        let script = [
            Control::FastForward,
            Control::Pause,
            Control::StepReverse,
            Control::FastReverse,
            Control::FastReverse,
            Control::NextEvent,
            Control::StepForward,
            Control::FastForward,
            Control::NextEvent,
            Control::FastReverse,
            Control::PrevEvent,
            Control::Play,
            Control::StepForward,
        ];
        for control in script.iter().cycle().take(60) {
            let _ = v.trigger(*control);
            for _ in 0..2 {
                tick(&mut v);
                let s = v.session().unwrap();
                assert!(s.frame >= 1 && s.frame <= s.last_frame, "frame {} of {}", s.frame, s.last_frame);
                assert_ne!(s.speed, 0);
                match s.state {
                    DvrState::Moving => assert!(
                        v.timers().recurring.is_active(),
                        "MOVING without a running loop"
                    ),
                    DvrState::Rewound => assert_eq!(s.frame, 1),
                    DvrState::Ended => assert_eq!(s.frame, s.last_frame),
                    DvrState::Paused => {
                        assert!(s.frame > 1 && s.frame < s.last_frame)
                    }
                }
            }
        }
    }
}
