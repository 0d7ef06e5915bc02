//! Per-agent recovery loops as polled deadlines.
//!
//! | Loop        | Default period | Acts when                                 |
//! |-------------|----------------|-------------------------------------------|
//! | idle retry  | 1 s            | the agent is `Idle`                       |
//! | keepalive   | 0.5 s          | the movement layer reports an active path |
//! | watchdog    | 3 s            | displacement since last sample < ε        |
//!
//! The loops run on independent timers.  Each one is polled every tick, so
//! a firing can coincide with a state transition in the same tick; the
//! agent runs the state machine first and the loops after it.

use hv_core::time::secs_to_ms;
use hv_core::{AgentTuning, PeriodicTimer, SimTime, Vec3};

#[derive(Clone, Debug)]
pub struct RecoveryTimers {
    idle_retry: PeriodicTimer,
    keepalive:  PeriodicTimer,
    watchdog:   PeriodicTimer,
    /// Position at the previous watchdog sample, and when it was taken.
    reference:  (Vec3, SimTime),
}

impl RecoveryTimers {
    /// Timers for an agent created at `pos` at time `now`.  The idle retry
    /// fires immediately; the other loops first fire one period later.
    pub fn new(tuning: &AgentTuning, now: SimTime, pos: Vec3) -> Self {
        Self {
            idle_retry: PeriodicTimer::immediate(secs_to_ms(tuning.idle_retry_secs), now),
            keepalive:  PeriodicTimer::after_period(secs_to_ms(tuning.keepalive_secs), now),
            watchdog:   PeriodicTimer::after_period(secs_to_ms(tuning.watchdog_secs), now),
            reference:  (pos, now),
        }
    }

    #[inline]
    pub fn idle_retry_due(&mut self, now: SimTime) -> bool {
        self.idle_retry.poll(now)
    }

    #[inline]
    pub fn keepalive_due(&mut self, now: SimTime) -> bool {
        self.keepalive.poll(now)
    }

    /// Take a watchdog sample if one is due.
    ///
    /// Returns `None` when no sample was due, otherwise `Some(stalled)`
    /// where `stalled` means the agent moved less than `epsilon` since the
    /// previous sample.  The sample becomes the new reference either way.
    pub fn watchdog_sample(&mut self, now: SimTime, pos: Vec3, epsilon: f32) -> Option<bool> {
        if !self.watchdog.poll(now) {
            return None;
        }
        let stalled = pos.distance_sq(self.reference.0) < epsilon * epsilon;
        self.reference = (pos, now);
        Some(stalled)
    }

    /// Position and time of the last watchdog sample.
    pub fn reference(&self) -> (Vec3, SimTime) {
        self.reference
    }
}
