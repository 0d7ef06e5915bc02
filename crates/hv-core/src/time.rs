//! Simulation time model.
//!
//! # Design
//!
//! The coordinator advances a monotonically increasing `Tick` counter.  Each
//! tick represents a fixed number of milliseconds, held in `SimClock`:
//!
//!   sim_time_ms = tick * tick_duration_ms
//!
//! All durations in the scheduling core (harvest wait, slot timeout, recovery
//! loop periods) are compared against `SimTime`, an integer millisecond
//! count.  Integer time keeps timeout comparisons exact: a slot reserved at
//! `T` with timeout `D` is still busy at `T + D` and free at the first sweep
//! after it.
//!
//! Periodic work (spawning, idle retry, keepalive, watchdog) is driven by
//! [`PeriodicTimer`], a non-blocking deadline that the owner polls once per
//! tick.  Nothing in the workspace ever sleeps.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Milliseconds of simulated time since the run started.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub const fn from_millis(ms: u64) -> Self {
        SimTime(ms)
    }

    /// Convert fractional seconds, rounding to the nearest millisecond.
    /// Negative inputs clamp to zero.
    #[inline]
    pub fn from_secs_f32(secs: f32) -> Self {
        SimTime(secs_to_ms(secs))
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is
    /// in the future.
    #[inline]
    pub fn saturating_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[inline]
    pub fn plus_millis(self, ms: u64) -> SimTime {
        SimTime(self.0 + ms)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f32())
    }
}

/// Fractional seconds → whole milliseconds (rounded, clamped at zero).
#[inline]
pub fn secs_to_ms(secs: f32) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Maps the tick counter onto simulated milliseconds.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// How many simulated milliseconds one tick represents.
    pub tick_duration_ms: u32,
    /// The current tick, advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(tick_duration_ms: u32) -> Self {
        Self {
            tick_duration_ms,
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick + 1;
    }

    /// Simulated time at the start of the current tick.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.time_at(self.current_tick)
    }

    #[inline]
    pub fn time_at(&self, tick: Tick) -> SimTime {
        SimTime(tick.0 * self.tick_duration_ms as u64)
    }

    /// Tick length in seconds, the `dt` handed to the movement layer.
    #[inline]
    pub fn dt_secs(&self) -> f32 {
        self.tick_duration_ms as f32 / 1000.0
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.current_tick, self.now())
    }
}

// ── PeriodicTimer ─────────────────────────────────────────────────────────────

/// A fixed-rate, non-blocking repeating deadline.
///
/// The owner calls [`poll`](Self::poll) once per tick; it returns `true` at
/// most once per call, when the deadline has been reached, and re-arms
/// itself.  If several periods elapsed since the last poll (a long tick) the
/// missed firings are dropped rather than replayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodicTimer {
    period_ms: u64,
    next_due:  SimTime,
}

impl PeriodicTimer {
    /// A timer whose first firing is at `first_due`.  A zero period is
    /// bumped to 1 ms so the timer can never fire twice in one instant.
    pub fn new(period_ms: u64, first_due: SimTime) -> Self {
        Self { period_ms: period_ms.max(1), next_due: first_due }
    }

    /// A timer that fires on the first poll at or after `now`.
    pub fn immediate(period_ms: u64, now: SimTime) -> Self {
        Self::new(period_ms, now)
    }

    /// A timer that first fires one full period after `now`.
    pub fn after_period(period_ms: u64, now: SimTime) -> Self {
        Self::new(period_ms, now.plus_millis(period_ms.max(1)))
    }

    /// `true` if the deadline has passed; re-arms for the next period.
    pub fn poll(&mut self, now: SimTime) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due = self.next_due.plus_millis(self.period_ms);
        if self.next_due <= now {
            // Skip the periods we slept through.
            let behind = now.saturating_since(self.next_due) / self.period_ms + 1;
            self.next_due = self.next_due.plus_millis(behind * self.period_ms);
        }
        true
    }

    /// Change the period and fire again on the first poll at or after `now`.
    pub fn restart(&mut self, period_ms: u64, now: SimTime) {
        self.period_ms = period_ms.max(1);
        self.next_due = now;
    }

    #[inline]
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    #[inline]
    pub fn next_due(&self) -> SimTime {
        self.next_due
    }
}
