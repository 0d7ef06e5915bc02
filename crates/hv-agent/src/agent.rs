//! The harvesting agent.
//!
//! # Reservation discipline
//!
//! An agent holds at most one [`ResourceLease`] (while `Seeking` or
//! `Harvesting`) and at most one [`SlotLease`] (while `Returning`), never
//! both.  Every path that drops a lease it no longer needs releases it
//! explicitly: a stale lease can only fail to release, never free someone
//! else's reservation.
//!
//! A held resource lease is renewed on every `Seeking` and `Harvesting`
//! tick, so the pool's stale sweep only reclaims reservations whose holder
//! has stopped ticking.

use tracing::{debug, trace};

use hv_core::time::secs_to_ms;
use hv_core::{AgentId, AgentRng, AgentTuning, HubId, ResourceId, SimTime, SlotId, Vec3};
use hv_hub::{Hub, SlotLease};
use hv_motion::Motion;
use hv_pool::{ResourceLease, ResourcePool};

use crate::{AgentContext, AgentEvent, RecoveryTimers, TaskState};

pub struct Agent<M> {
    id:          AgentId,
    home:        HubId,
    state:       TaskState,
    target:      Option<ResourceLease>,
    slot:        Option<SlotLease>,
    carrying:    bool,
    harvest_due: SimTime,
    timers:      RecoveryTimers,
    motion:      M,
    rng:         AgentRng,
}

impl<M: Motion> Agent<M> {
    /// A fresh `Idle` agent.  Its first tick polls the pool.
    pub fn new(
        id:     AgentId,
        home:   HubId,
        motion: M,
        rng:    AgentRng,
        tuning: &AgentTuning,
        now:    SimTime,
    ) -> Self {
        let timers = RecoveryTimers::new(tuning, now, motion.position());
        Self {
            id,
            home,
            state: TaskState::Idle,
            target: None,
            slot: None,
            carrying: false,
            harvest_due: SimTime::ZERO,
            timers,
            motion,
            rng,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[inline]
    pub fn home(&self) -> HubId {
        self.home
    }

    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    #[inline]
    pub fn is_carrying(&self) -> bool {
        self.carrying
    }

    pub fn target(&self) -> Option<&ResourceLease> {
        self.target.as_ref()
    }

    pub fn target_id(&self) -> Option<ResourceId> {
        self.target.as_ref().map(|l| l.id())
    }

    /// Held slot, or `SlotId::INVALID`.
    pub fn slot(&self) -> SlotId {
        self.slot.map_or(SlotId::INVALID, |l| l.id())
    }

    pub fn slot_lease(&self) -> Option<&SlotLease> {
        self.slot.as_ref()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.motion.position()
    }

    pub fn motion(&self) -> &M {
        &self.motion
    }

    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    pub fn timers(&self) -> &RecoveryTimers {
        &self.timers
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Run one tick: the state machine, then the idle-retry, keepalive and
    /// watchdog loops.  Returns what happened, in order.
    pub fn tick(&mut self, ctx: &AgentContext<'_>) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        self.step(ctx, &mut events);

        if self.timers.idle_retry_due(ctx.now) && self.state == TaskState::Idle {
            self.next_target(ctx.pool, ctx.now, &mut events);
        }

        if self.timers.keepalive_due(ctx.now) && self.motion.has_path() {
            if let Some(dest) = self.motion.destination() {
                self.motion.set_destination(dest);
            }
        }

        let pos = self.motion.position();
        if let Some(true) = self.timers.watchdog_sample(ctx.now, pos, ctx.tuning.watchdog_epsilon) {
            self.on_stalled(ctx, pos, &mut events);
        }

        events
    }

    fn step(&mut self, ctx: &AgentContext<'_>, events: &mut Vec<AgentEvent>) {
        match self.state {
            TaskState::Idle => {}

            TaskState::Seeking => {
                let held = self.target.as_mut().is_some_and(|l| l.renew(ctx.now));
                if !held {
                    if let Some(lost) = self.target.take() {
                        lost.release();
                        debug!(agent = %self.id, resource = %lost.id(), "target lost while seeking");
                        events.push(AgentEvent::TargetLost { resource: lost.id() });
                    }
                    self.next_target(ctx.pool, ctx.now, events);
                    return;
                }
                if !self.motion.path_pending()
                    && self.motion.remaining_distance() < ctx.tuning.arrival_radius
                {
                    self.state = TaskState::Harvesting;
                    self.harvest_due = ctx.now.plus_millis(secs_to_ms(ctx.tuning.harvest_secs));
                    if let Some(lease) = &self.target {
                        trace!(agent = %self.id, resource = %lease.id(), "harvest started");
                        events.push(AgentEvent::HarvestStarted { resource: lease.id() });
                    }
                }
            }

            TaskState::Harvesting => {
                if let Some(lease) = self.target.as_mut() {
                    lease.renew(ctx.now);
                }
                if ctx.now < self.harvest_due {
                    return;
                }
                if let Some(lease) = self.target.take() {
                    if lease.try_take() {
                        lease.node().deactivate();
                        self.carrying = true;
                        trace!(agent = %self.id, resource = %lease.id(), "harvested");
                        events.push(AgentEvent::Harvested { resource: lease.id() });
                    } else {
                        debug!(agent = %self.id, resource = %lease.id(), "take failed, returning empty");
                        events.push(AgentEvent::HarvestFailed { resource: lease.id() });
                    }
                }
                self.head_home(ctx, events);
            }

            TaskState::Returning => {
                let r = ctx.home.radius() + self.motion.stopping_distance();
                if self.motion.position().distance_sq_xz(ctx.home.center()) > r * r {
                    return;
                }
                if self.carrying {
                    let store = ctx.home.deposit();
                    trace!(agent = %self.id, hub = %self.home, store, "delivered");
                    events.push(AgentEvent::Delivered { store });
                } else {
                    events.push(AgentEvent::ReturnedEmpty);
                }
                self.carrying = false;
                self.release_slot(ctx.home);
                self.next_target(ctx.pool, ctx.now, events);
            }
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Poll the pool for the nearest free resource.  `Seeking` on success,
    /// `Idle` otherwise.
    fn next_target(&mut self, pool: &ResourcePool, now: SimTime, events: &mut Vec<AgentEvent>) {
        if let Some(old) = self.target.take() {
            old.release();
        }
        match pool.nearest_free(self.motion.position(), now) {
            Some(lease) => {
                let (resource, position) = (lease.id(), lease.position());
                self.motion.set_destination(position);
                self.target = Some(lease);
                self.state = TaskState::Seeking;
                trace!(agent = %self.id, resource = %resource, "target reserved");
                events.push(AgentEvent::Targeted { resource, position });
            }
            None => self.state = TaskState::Idle,
        }
    }

    /// Request a slot at home and head for whatever position comes back.
    fn head_home(&mut self, ctx: &AgentContext<'_>, events: &mut Vec<AgentEvent>) {
        self.release_slot(ctx.home);
        let grant = ctx.home.try_get_slot(ctx.now, ctx.surface, &mut self.rng);
        self.slot = grant.lease;
        self.motion.set_destination(grant.position);
        self.state = TaskState::Returning;
        events.push(match grant.lease {
            Some(lease) => AgentEvent::SlotGranted { slot: lease.id(), position: grant.position },
            None => AgentEvent::SlotFallback { position: grant.position },
        });
    }

    fn release_slot(&mut self, home: &Hub) {
        if let Some(lease) = self.slot.take() {
            if !home.release(&lease) {
                trace!(agent = %self.id, slot = %lease.id(), "slot already reclaimed");
            }
        }
    }

    /// Stuck-watchdog response.  Harvesting is a deliberate wait in place
    /// and is never judged stalled.
    fn on_stalled(&mut self, ctx: &AgentContext<'_>, pos: Vec3, events: &mut Vec<AgentEvent>) {
        let state = self.state;
        match state {
            TaskState::Idle | TaskState::Harvesting => return,
            TaskState::Seeking | TaskState::Returning => {}
        }
        debug!(agent = %self.id, %state, %pos, "stuck, abandoning path");
        events.push(AgentEvent::WatchdogRetarget { state, position: pos });
        self.motion.reset_path();

        if state == TaskState::Returning && self.carrying {
            // Keep the cargo; ask for a fresh slot.
            self.head_home(ctx, events);
        } else {
            self.release_slot(ctx.home);
            self.next_target(ctx.pool, ctx.now, events);
        }
    }

    // ── Removal ───────────────────────────────────────────────────────────

    /// Release every reservation and stop.  Call before discarding the
    /// agent; `home` must be the agent's home hub.
    pub fn retire(&mut self, home: &Hub) -> Vec<AgentEvent> {
        if let Some(lease) = self.target.take() {
            lease.release();
        }
        self.release_slot(home);
        self.carrying = false;
        self.motion.reset_path();
        self.state = TaskState::Idle;
        debug!(agent = %self.id, hub = %self.home, "agent retired");
        vec![AgentEvent::Retired]
    }
}

impl<M> std::fmt::Debug for Agent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("home", &self.home)
            .field("state", &self.state)
            .field("target", &self.target.as_ref().map(|l| l.id()))
            .field("slot", &self.slot.map(|l| l.id()))
            .field("carrying", &self.carrying)
            .finish()
    }
}
