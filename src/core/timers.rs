//! Timer slots for the playback loop.
//!
//! A slot holds a captured context value plus the instant it is due. Nothing
//! runs on its own: the owner calls [`TimerSlot::poll`] with the current time
//! (once per UI frame in the app, with synthetic instants in tests) and acts
//! on the returned context. Cancelling is just dropping the pending value.
//!
//! Two slots exist per viewer:
//! - recurring: carries a [`Motion`] (frame delta per tick) and re-arms itself
//!   until the viewer sees a terminal step outcome and cancels it
//! - one-shot: carries a [`Resume`] used to restart fast motion one tick after
//!   crossing into another event

use log::trace;
use std::time::{Duration, Instant};

use super::dvr::DvrState;

/// Captured context of the recurring timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    /// Frames per tick; sign is direction
    pub delta: i32,
}

impl Motion {
    /// State entered when the loop hits its boundary
    pub fn terminal_state(&self) -> DvrState {
        if self.delta > 0 {
            DvrState::Ended
        } else {
            DvrState::Rewound
        }
    }
}

/// Captured context of the one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Step off frame 1, then fast forward at the carried speed
    FastForward,
    /// Step off the last frame, then fast reverse at the carried speed
    FastReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Once,
    Repeat,
}

/// One pending timer with its context
#[derive(Debug, Clone)]
pub struct TimerSlot<T: Copy> {
    mode: Mode,
    period: Duration,
    pending: Option<(T, Instant)>,
}

impl<T: Copy> TimerSlot<T> {
    pub fn once(period: Duration) -> Self {
        Self {
            mode: Mode::Once,
            period,
            pending: None,
        }
    }

    pub fn repeating(period: Duration) -> Self {
        Self {
            mode: Mode::Repeat,
            period,
            pending: None,
        }
    }

    /// Arm with `context`, first due one period after `now`. Replaces any pending value.
    pub fn start(&mut self, context: T, now: Instant) {
        self.pending = Some((context, now + self.period));
    }

    /// Drop the pending value. Returns true if something was armed.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    pub fn context(&self) -> Option<T> {
        self.pending.map(|(ctx, _)| ctx)
    }

    pub fn due_at(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Fire at most once if due. Repeating slots re-arm one period after `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (context, due) = self.pending?;
        if now < due {
            return None;
        }
        match self.mode {
            Mode::Once => self.pending = None,
            Mode::Repeat => self.pending = Some((context, now + self.period)),
        }
        Some(context)
    }
}

/// The viewer's two timer families
#[derive(Debug, Clone)]
pub struct Timers {
    pub recurring: TimerSlot<Motion>,
    pub deferred: TimerSlot<Resume>,
}

impl Timers {
    pub fn new(period: Duration) -> Self {
        Self {
            recurring: TimerSlot::repeating(period),
            deferred: TimerSlot::once(period),
        }
    }

    /// Cancel both slots
    pub fn abort(&mut self) {
        let had_recurring = self.recurring.cancel();
        let had_deferred = self.deferred.cancel();
        if had_recurring || had_deferred {
            trace!(
                "Timers aborted (recurring: {}, deferred: {})",
                had_recurring, had_deferred
            );
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.recurring.is_active() && !self.deferred.is_active()
    }

    /// Earliest due instant across both slots
    pub fn next_due(&self) -> Option<Instant> {
        match (self.recurring.due_at(), self.deferred.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(35);

    #[test]
    fn test_not_due_before_period() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::repeating(PERIOD);
        slot.start(Motion { delta: 1 }, t0);
        assert!(slot.poll(t0).is_none());
        assert!(slot.poll(t0 + PERIOD / 2).is_none());
        assert_eq!(slot.poll(t0 + PERIOD), Some(Motion { delta: 1 }));
    }

    #[test]
    fn test_repeating_rearms() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::repeating(PERIOD);
        slot.start(Motion { delta: -2 }, t0);
        for k in 1..=5u32 {
            assert_eq!(slot.poll(t0 + PERIOD * k), Some(Motion { delta: -2 }));
        }
        assert!(slot.is_active());
        assert_eq!(slot.due_at(), Some(t0 + PERIOD * 6));
    }

    #[test]
    fn test_once_fires_once() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::once(PERIOD);
        slot.start(Resume::FastReverse, t0);
        assert_eq!(slot.poll(t0 + PERIOD), Some(Resume::FastReverse));
        assert!(!slot.is_active());
        assert!(slot.poll(t0 + PERIOD * 2).is_none());
    }

    #[test]
    fn test_restart_replaces_context() {
        let t0 = Instant::now();
        let mut slot = TimerSlot::repeating(PERIOD);
        slot.start(Motion { delta: 2 }, t0);
        slot.start(Motion { delta: 4 }, t0 + PERIOD / 2);
        assert!(slot.poll(t0 + PERIOD).is_none());
        assert_eq!(slot.context(), Some(Motion { delta: 4 }));
    }

    #[test]
    fn test_abort_clears_both() {
        let t0 = Instant::now();
        let mut timers = Timers::new(PERIOD);
        timers.recurring.start(Motion { delta: 1 }, t0);
        timers.deferred.start(Resume::FastForward, t0);
        assert_eq!(timers.next_due(), Some(t0 + PERIOD));
        timers.abort();
        assert!(timers.is_idle());
        assert!(timers.next_due().is_none());
        assert!(timers.recurring.poll(t0 + PERIOD).is_none());
    }

    #[test]
    fn test_terminal_state_follows_direction() {
        assert_eq!(Motion { delta: 1 }.terminal_state(), DvrState::Ended);
        assert_eq!(Motion { delta: 8 }.terminal_state(), DvrState::Ended);
        assert_eq!(Motion { delta: -2 }.terminal_state(), DvrState::Rewound);
    }
}
