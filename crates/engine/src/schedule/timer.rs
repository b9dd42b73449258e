use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

const MILLIS_PER_SECOND: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error(
        "timer rate must be a positive finite number of counts per second, got {rate}"
    )]
    InvalidRate { rate: f64 },
    #[error("timer period must contain at least one count")]
    EmptyPeriod,
    #[error("delay must be longer than zero")]
    ZeroDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Wraps at the end of every period and keeps firing until removed.
    Repeating,
    /// Fires counts `1..period_count - 1` once, then deactivates itself.
    OneShot,
}

/// Flags shared between a [`Timer`] and every handle pointing at it.
#[derive(Debug, Default)]
pub(crate) struct TimerControl {
    cancelled: Cell<bool>,
    paused: Cell<bool>,
}

impl TimerControl {
    pub(crate) fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub(crate) fn is_live(&self) -> bool {
        !self.cancelled.get()
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused.get()
    }
}

pub type TimerCallback = Box<dyn FnMut(u32)>;

/// A countdown that fires its callback once per count crossed.
///
/// Count numbering: `current_count` is 0 while no count of the current
/// period has been crossed. The k-th crossing of a period fires
/// `k % period_count`, so a full period fires `1, 2, .., N - 1, 0`, and the
/// wrap to 0 resets `elapsed` as well. Any remainder past the wrap is
/// discarded, so one `advance` completes at most one period.
pub struct Timer {
    rate: f64,
    period_count: u32,
    interval_ms: f64,
    elapsed_ms: f64,
    current_count: u32,
    kind: TimerKind,
    control: Rc<TimerControl>,
    callback: TimerCallback,
}

impl Timer {
    pub fn new(
        rate: f64,
        period_count: u32,
        kind: TimerKind,
        callback: impl FnMut(u32) + 'static,
    ) -> Result<Self, ScheduleError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ScheduleError::InvalidRate { rate });
        }
        // The interval must also be expressible as a `Duration`.
        if Duration::try_from_secs_f64(rate.recip()).is_err() {
            return Err(ScheduleError::InvalidRate { rate });
        }
        if period_count == 0 {
            return Err(ScheduleError::EmptyPeriod);
        }
        Ok(Self {
            rate,
            period_count,
            interval_ms: MILLIS_PER_SECOND / rate,
            elapsed_ms: 0.0,
            current_count: 0,
            kind,
            control: Rc::new(TimerControl::default()),
            callback: Box::new(callback),
        })
    }

    /// Builds a timer from its interval rather than its rate.
    pub fn with_interval(
        interval: Duration,
        period_count: u32,
        kind: TimerKind,
        callback: impl FnMut(u32) + 'static,
    ) -> Result<Self, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroDelay);
        }
        Self::new(
            MILLIS_PER_SECOND / duration_to_millis(interval),
            period_count,
            kind,
            callback,
        )
    }

    /// Advances by `dt` and fires every count crossed. Returns how many
    /// counts fired.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if !self.can_fire() {
            return 0;
        }

        self.elapsed_ms += duration_to_millis(dt);
        let mut fired = 0u32;
        while self.can_fire() && self.elapsed_ms >= self.next_threshold_ms() {
            self.current_count += 1;
            if self.current_count >= self.period_count {
                self.elapsed_ms = 0.0;
                self.current_count = 0;
            }

            let count = self.current_count;
            (self.callback)(count);
            fired += 1;

            if self.kind == TimerKind::OneShot && count == self.period_count - 1 {
                self.control.cancel();
            }
        }
        fired
    }

    pub fn pause(&self) {
        self.control.set_paused(true);
    }

    pub fn resume(&self) {
        self.control.set_paused(false);
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }

    /// False once cancelled or, for one-shot timers, once the last count fired.
    pub fn is_active(&self) -> bool {
        self.control.is_live()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn period_count(&self) -> u32 {
        self.period_count
    }

    pub fn interval(&self) -> Duration {
        let seconds = self.interval_ms / MILLIS_PER_SECOND;
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn current_count(&self) -> u32 {
        self.current_count
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub(crate) fn control(&self) -> Rc<TimerControl> {
        Rc::clone(&self.control)
    }

    fn can_fire(&self) -> bool {
        self.control.is_live() && !self.control.is_paused()
    }

    fn next_threshold_ms(&self) -> f64 {
        f64::from(self.current_count + 1) * self.interval_ms
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("rate", &self.rate)
            .field("period_count", &self.period_count)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("current_count", &self.current_count)
            .field("kind", &self.kind)
            .field("active", &self.is_active())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

// Nanosecond integer first so whole-millisecond deltas stay exact.
pub(crate) fn duration_to_millis(dt: Duration) -> f64 {
    dt.as_nanos() as f64 / 1_000_000.0
}
