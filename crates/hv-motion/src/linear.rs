//! Straight-line mover.
//!
//! Moves at constant speed directly towards the destination and stops on
//! it.  Path planning is modelled as a fixed latency of `latency_ticks`
//! `advance` calls during which `path_pending` is `true` and the mover stays
//! put.  A blocked mover never moves, which is how tests and demos pin an
//! agent in place to exercise the stuck watchdog.

use hv_core::{AgentId, Vec3};

use crate::motion::{Motion, MotionFactory};

/// Stopping distance used by the default factory.
pub const DEFAULT_STOPPING_DISTANCE: f32 = 0.35;

#[derive(Clone, Debug, PartialEq)]
pub struct LinearMotion {
    position:          Vec3,
    destination:       Option<Vec3>,
    speed:             f32,
    stopping_distance: f32,
    latency_ticks:     u32,
    pending_ticks:     u32,
    blocked:           bool,
}

impl LinearMotion {
    pub fn new(at: Vec3, speed: f32) -> Self {
        Self {
            position:          at,
            destination:       None,
            speed:             speed.max(0.0),
            stopping_distance: DEFAULT_STOPPING_DISTANCE,
            latency_ticks:     0,
            pending_ticks:     0,
            blocked:           false,
        }
    }

    pub fn with_latency(mut self, ticks: u32) -> Self {
        self.latency_ticks = ticks;
        self
    }

    pub fn with_stopping_distance(mut self, d: f32) -> Self {
        self.stopping_distance = d.max(0.0);
        self
    }

    /// Pin the mover in place (`true`) or let it move again.
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Teleport without touching the path.
    pub fn warp(&mut self, to: Vec3) {
        self.position = to;
    }
}

impl Motion for LinearMotion {
    /// Re-requesting the current destination keeps the existing path.
    fn set_destination(&mut self, target: Vec3) {
        if self.destination == Some(target) {
            return;
        }
        self.destination = Some(target);
        self.pending_ticks = self.latency_ticks;
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn remaining_distance(&self) -> f32 {
        match self.destination {
            Some(d) if self.pending_ticks == 0 => self.position.distance(d),
            _ => f32::INFINITY,
        }
    }

    fn path_pending(&self) -> bool {
        self.destination.is_some() && self.pending_ticks > 0
    }

    fn has_path(&self) -> bool {
        self.destination.is_some() && self.pending_ticks == 0
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.pending_ticks = 0;
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn advance(&mut self, dt: f32) {
        let Some(dest) = self.destination else { return };
        if self.pending_ticks > 0 {
            self.pending_ticks -= 1;
            return;
        }
        if self.blocked {
            return;
        }
        let to = dest - self.position;
        let dist = to.length();
        let step = self.speed * dt;
        self.position = if step >= dist { dest } else { self.position + to * (step / dist) };
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Builds [`LinearMotion`]s with shared latency and stopping distance.
#[derive(Clone, Debug)]
pub struct LinearMotionFactory {
    pub latency_ticks:     u32,
    pub stopping_distance: f32,
}

impl Default for LinearMotionFactory {
    fn default() -> Self {
        Self { latency_ticks: 0, stopping_distance: DEFAULT_STOPPING_DISTANCE }
    }
}

impl MotionFactory for LinearMotionFactory {
    type Motion = LinearMotion;

    fn spawn(&self, _agent: AgentId, at: Vec3, speed: f32) -> LinearMotion {
        LinearMotion::new(at, speed)
            .with_latency(self.latency_ticks)
            .with_stopping_distance(self.stopping_distance)
    }
}
