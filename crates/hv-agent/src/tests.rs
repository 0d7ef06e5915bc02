//! Unit tests for hv-agent.
//!
//! Each test drives one or two agents through a hand-built world with
//! resources at known positions, in 50 ms ticks.

#[cfg(test)]
mod helpers {
    use hv_core::{
        AgentId, AgentRng, AgentTuning, HubId, PoolConfig, ResourceId, SimClock, SimRng,
        SimTime, SlotConfig, Vec3,
    };
    use hv_hub::{Hub, HubSpec};
    use hv_motion::{LinearMotion, Motion};
    use hv_pool::ResourcePool;
    use hv_spatial::{NavSurface, OpenGround};

    use crate::{Agent, AgentContext, AgentEvent};

    /// Places every spawn at one fixed point.
    pub struct At(pub Vec3);
    impl NavSurface for At {
        fn sample(&self, _raw: Vec3, _max_snap: f32) -> Option<Vec3> {
            Some(self.0)
        }
    }

    pub struct World {
        pub pool:    ResourcePool,
        pub hub:     Hub,
        pub surface: OpenGround,
        pub tuning:  AgentTuning,
        pub clock:   SimClock,
        /// Resource reservation timeout; `None` leaves the sweep off.
        pub sweep_ms: Option<u64>,
    }

    impl World {
        pub fn new() -> Self {
            Self::with_slots(8)
        }

        pub fn with_slots(slots: usize) -> Self {
            let pool_cfg = PoolConfig { capacity: 8, reservation_timeout_secs: None, ..PoolConfig::default() };
            let mut spec = HubSpec::new("Blue", Vec3::ZERO);
            spec.slots = slots;
            Self {
                pool:    ResourcePool::new(&pool_cfg),
                hub:     Hub::new(HubId(0), &spec, &SlotConfig::default()).unwrap(),
                surface: OpenGround::unbounded(),
                tuning:  AgentTuning::default(),
                clock:   SimClock::new(50),
                sweep_ms: None,
            }
        }

        pub fn with_sweep(timeout_ms: u64) -> Self {
            Self { sweep_ms: Some(timeout_ms), ..Self::new() }
        }

        /// The pool phase of a tick: the stale-reservation sweep, if enabled.
        pub fn sweep(&mut self) {
            if let Some(timeout) = self.sweep_ms {
                self.pool.reclaim_stale(self.now(), timeout);
            }
        }

        pub fn now(&self) -> SimTime {
            self.clock.now()
        }

        pub fn place(&mut self, at: Vec3) -> ResourceId {
            let now = self.now();
            self.pool.spawn(now, &At(at), &mut SimRng::new(0)).unwrap()
        }

        pub fn agent(&self, id: u32) -> Agent<LinearMotion> {
            let motion = LinearMotion::new(self.hub.center(), 4.0);
            Agent::new(
                AgentId(id),
                self.hub.id(),
                motion,
                AgentRng::new(7, AgentId(id)),
                &self.tuning,
                self.now(),
            )
        }

        /// One coordinator tick for a single agent: move, pool sweep, think,
        /// slot sweep.
        pub fn step<M: Motion>(&mut self, agent: &mut Agent<M>) -> Vec<AgentEvent> {
            agent.motion_mut().advance(self.clock.dt_secs());
            self.sweep();
            let ctx = AgentContext::new(self.now(), &self.pool, &self.hub, &self.surface, &self.tuning);
            let events = agent.tick(&ctx);
            self.hub.reclaim_stale(self.now());
            self.clock.advance();
            events
        }

        /// Step until `pred` matches an event or `max_ticks` pass.  Returns
        /// every event seen.
        pub fn run_until<M: Motion>(
            &mut self,
            agent: &mut Agent<M>,
            max_ticks: usize,
            pred: impl Fn(&AgentEvent) -> bool,
        ) -> Vec<AgentEvent> {
            let mut all = Vec::new();
            for _ in 0..max_ticks {
                let events = self.step(agent);
                let hit = events.iter().any(&pred);
                all.extend(events);
                if hit {
                    return all;
                }
            }
            panic!("condition not reached within {max_ticks} ticks; events: {all:?}");
        }

        /// Step until simulated time reaches `t` (inclusive).
        pub fn run_to<M: Motion>(&mut self, agent: &mut Agent<M>, t: SimTime) -> Vec<AgentEvent> {
            let mut all = Vec::new();
            while self.now() <= t {
                all.extend(self.step(agent));
            }
            all
        }
    }
}

// ── Happy path ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod cycle {
    use hv_core::Vec3;
    use hv_motion::Motion;

    use super::helpers::World;
    use crate::{AgentEvent, TaskState};

    #[test]
    fn first_tick_polls_immediately() {
        let mut w = World::new();
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        let events = w.step(&mut a);
        assert_eq!(events, vec![AgentEvent::Targeted { resource: id, position: Vec3::ground(4.0, 0.0) }]);
        assert_eq!(a.state(), TaskState::Seeking);
        assert_eq!(a.target_id(), Some(id));
    }

    #[test]
    fn full_delivery_credits_store_and_frees_slot() {
        let mut w = World::new();
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);

        let events = w.run_until(&mut a, 400, |e| matches!(e, AgentEvent::Delivered { .. }));
        let kinds: Vec<&str> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            ["targeted", "harvest_started", "harvested", "slot_granted", "delivered"]
        );

        assert_eq!(w.hub.store(), 1);
        assert_eq!(w.hub.busy_slots(), 0, "slot released on delivery");
        assert!(!a.is_carrying());
        assert_eq!(a.slot(), hv_core::SlotId::INVALID);
        assert!(!w.pool.get(id).unwrap().is_live(), "taken node is deactivated");
        assert_eq!(a.state(), TaskState::Idle, "nothing left to harvest");
    }

    #[test]
    fn harvest_waits_full_duration() {
        let mut w = World::new();
        w.place(Vec3::ground(1.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::HarvestStarted { .. }));
        let started = w.now();
        assert_eq!(a.state(), TaskState::Harvesting);
        w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::Harvested { .. }));
        // `now` has advanced one tick past the tick that harvested.
        let waited = w.now().saturating_since(started);
        assert!(waited >= 2_000, "harvested after {waited} ms");
        assert!(waited <= 2_100, "harvested after {waited} ms");
    }

    #[test]
    fn arrival_requires_completed_planning() {
        let mut w = World::new();
        w.place(Vec3::ground(0.1, 0.0));
        let mut a = w.agent(0);
        // Within arrival radius from the start, but planning takes 3 ticks.
        *a.motion_mut() = hv_motion::LinearMotion::new(Vec3::ZERO, 4.0).with_latency(3);
        w.step(&mut a);
        assert!(a.motion().path_pending());
        w.step(&mut a);
        assert_eq!(a.state(), TaskState::Seeking);
        w.run_until(&mut a, 10, |e| matches!(e, AgentEvent::HarvestStarted { .. }));
    }

    #[test]
    fn two_agents_split_two_resources() {
        let mut w = World::new();
        w.place(Vec3::ground(3.0, 0.0));
        w.place(Vec3::ground(-3.0, 0.0));
        let mut a = w.agent(0);
        let mut b = w.agent(1);
        let dt = w.clock.dt_secs();
        for _ in 0..200 {
            for agent in [&mut a, &mut b] {
                agent.motion_mut().advance(dt);
                let ctx = crate::AgentContext::new(w.now(), &w.pool, &w.hub, &w.surface, &w.tuning);
                agent.tick(&ctx);
            }
            w.hub.reclaim_stale(w.now());
            w.clock.advance();
        }
        assert_eq!(w.hub.store(), 2);
        assert_eq!(w.hub.busy_slots(), 0);
        assert_eq!(w.pool.live_count(), 0);
    }
}

// ── Contention and loss ───────────────────────────────────────────────────────

#[cfg(test)]
mod contention {
    use hv_core::Vec3;

    use super::helpers::World;
    use crate::{AgentEvent, TaskState};

    #[test]
    fn lost_take_returns_without_credit() {
        let mut w = World::new();
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::HarvestStarted { .. }));

        // External cleanup frees the node mid-harvest and a rival grabs it.
        let node = w.pool.get(id).unwrap().clone();
        node.free();
        let rival = node.try_reserve_at(w.now()).unwrap();

        let events = w.run_until(&mut a, 400, |e| matches!(e, AgentEvent::ReturnedEmpty));
        assert!(events.contains(&AgentEvent::HarvestFailed { resource: id }));
        assert!(events.iter().any(|e| matches!(e, AgentEvent::SlotGranted { .. })));
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::Delivered { .. })));

        assert_eq!(w.hub.store(), 0);
        assert_eq!(w.hub.busy_slots(), 0, "unused slot is released");
        assert!(rival.is_held(), "rival reservation untouched");
        assert!(node.is_live());
        assert_eq!(a.state(), TaskState::Idle);
    }

    #[test]
    fn invalidated_target_triggers_immediate_repoll() {
        let mut w = World::new();
        let near = w.place(Vec3::ground(4.0, 0.0));
        let far = w.place(Vec3::ground(-6.0, 0.0));
        let mut a = w.agent(0);
        w.step(&mut a);
        assert_eq!(a.target_id(), Some(near));

        assert!(w.pool.invalidate(near));
        let events = w.step(&mut a);
        assert_eq!(events[0], AgentEvent::TargetLost { resource: near });
        assert!(matches!(events[1], AgentEvent::Targeted { resource, .. } if resource == far));
        assert_eq!(a.state(), TaskState::Seeking);
    }

    #[test]
    fn full_ring_uses_fallback_and_leaves_foreign_slot() {
        let mut w = World::with_slots(1);
        w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::HarvestStarted { .. }));

        // Someone else holds the only slot.
        let mut rng = hv_core::AgentRng::new(1, hv_core::AgentId(99));
        let foreign = w.hub.try_get_slot(w.now(), &w.surface, &mut rng).lease.unwrap();

        let events = w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::SlotFallback { .. }));
        assert_eq!(events.last(), Some(&AgentEvent::SlotFallback { position: Vec3::ZERO }));
        assert_eq!(a.slot(), hv_core::SlotId::INVALID);

        w.run_until(&mut a, 100, |e| matches!(e, AgentEvent::Delivered { .. }));
        assert_eq!(w.hub.store(), 1);
        assert!(w.hub.holds(&foreign), "delivery does not free a slot it never held");
    }
}

// ── Resource reservation sweep ────────────────────────────────────────────────

#[cfg(test)]
mod sweep {
    use hv_core::{SimTime, Vec3};
    use hv_motion::Motion;

    use super::helpers::World;
    use crate::{AgentEvent, TaskState};

    #[test]
    fn long_trip_still_harvests() {
        let mut w = World::with_sweep(10_000);
        let id = w.place(Vec3::ground(9.0, 0.0));
        let mut a = w.agent(0);
        a.motion_mut().set_speed(1.0);

        let events = w.run_until(&mut a, 800, |e| matches!(e, AgentEvent::Delivered { .. }));
        assert!(events.contains(&AgentEvent::Harvested { resource: id }), "events: {events:?}");
        assert!(!events.iter().any(|e| matches!(e, AgentEvent::HarvestFailed { .. })));
        assert!(w.now() > SimTime(10_000), "trip outlasted the reservation timeout");
        assert_eq!(w.hub.store(), 1);
    }

    #[test]
    fn renewed_reservation_survives_sweep() {
        let mut w = World::with_sweep(10_000);
        let id = w.place(Vec3::ground(80.0, 0.0));
        let mut a = w.agent(0);
        w.run_to(&mut a, SimTime(12_000));
        assert_eq!(a.state(), TaskState::Seeking);
        assert_eq!(a.target_id(), Some(id));
        assert!(a.target().unwrap().is_held());
        assert!(a.target().unwrap().reserved_at() > SimTime(11_000));
    }

    #[test]
    fn abandoned_reservation_goes_to_next_agent() {
        let mut w = World::with_sweep(10_000);
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.step(&mut a);
        assert_eq!(a.target_id(), Some(id));
        // Discarded without `retire`: the reservation is stranded.
        drop(a);

        let mut b = w.agent(1);
        w.step(&mut b);
        assert_eq!(b.state(), TaskState::Idle);

        let events = w.run_until(&mut b, 400, |e| matches!(e, AgentEvent::Targeted { .. }));
        assert!(matches!(events.last(), Some(AgentEvent::Targeted { resource, .. }) if *resource == id));
        assert!(w.now() > SimTime(10_000));
        assert!(b.target().unwrap().is_held());
    }

    #[test]
    fn paused_holder_repolls_after_sweep() {
        let mut w = World::with_sweep(10_000);
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.step(&mut a);

        // The agent does not tick while the pool keeps sweeping.
        while w.now() <= SimTime(10_050) {
            w.sweep();
            w.clock.advance();
        }
        assert!(!a.target().unwrap().is_held());

        let events = w.step(&mut a);
        assert_eq!(events[0], AgentEvent::TargetLost { resource: id });
        assert!(matches!(events[1], AgentEvent::Targeted { resource, .. } if resource == id));
        assert!(a.target().unwrap().is_held());
    }
}

// ── Recovery loops ────────────────────────────────────────────────────────────

#[cfg(test)]
mod recovery {
    use hv_core::{SimTime, Vec3};
    use hv_motion::{LinearMotion, Motion};

    use super::helpers::World;
    use crate::{Agent, AgentEvent, TaskState};

    #[test]
    fn idle_retry_polls_once_per_period() {
        let mut w = World::new();
        let mut a = w.agent(0);
        w.step(&mut a);
        assert_eq!(a.state(), TaskState::Idle);

        w.place(Vec3::ground(2.0, 0.0));
        w.run_to(&mut a, SimTime(950));
        assert_eq!(a.state(), TaskState::Idle, "no poll before the retry period");

        let events = w.step(&mut a);
        assert!(matches!(events[0], AgentEvent::Targeted { .. }));
        assert_eq!(a.state(), TaskState::Seeking);
    }

    #[test]
    fn watchdog_retargets_stalled_seeker() {
        let mut w = World::new();
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        a.motion_mut().set_blocked(true);

        w.step(&mut a);
        let first = a.target().unwrap().reserved_at();
        assert_eq!(first, SimTime(0));

        let before = w.run_to(&mut a, SimTime(2_950));
        assert!(before.is_empty(), "no watchdog before its period: {before:?}");

        let events = w.step(&mut a);
        assert!(matches!(events[0], AgentEvent::WatchdogRetarget { state: TaskState::Seeking, .. }));
        assert!(matches!(events[1], AgentEvent::Targeted { resource, .. } if resource == id));

        // Fresh reservation, not the stale one.
        let lease = a.target().unwrap();
        assert_eq!(lease.reserved_at(), SimTime(3_000));
        assert!(lease.is_held());
        assert_eq!(a.state(), TaskState::Seeking);
    }

    #[test]
    fn watchdog_keeps_cargo_when_stuck_returning() {
        let mut w = World::new();
        w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 200, |e| matches!(e, AgentEvent::Harvested { .. }));
        a.motion_mut().set_blocked(true);

        let events = w.run_to(&mut a, SimTime(6_000));
        let retarget = events
            .iter()
            .position(|e| matches!(e, AgentEvent::WatchdogRetarget { state: TaskState::Returning, .. }))
            .expect("watchdog fired while returning");
        assert!(matches!(events[retarget + 1], AgentEvent::SlotGranted { .. }));

        assert!(a.is_carrying());
        assert_eq!(a.state(), TaskState::Returning);
        assert_eq!(w.hub.busy_slots(), 1, "old slot released, new one held");
    }

    #[test]
    fn watchdog_ignores_idle_agents() {
        let mut w = World::new();
        let mut a = w.agent(0);
        let events = w.run_to(&mut a, SimTime(9_000));
        assert!(events.is_empty());
        assert_eq!(a.state(), TaskState::Idle);
    }

    /// Counts destination requests.
    struct Counting {
        inner: LinearMotion,
        sets:  usize,
    }

    impl Motion for Counting {
        fn set_destination(&mut self, target: Vec3) {
            self.sets += 1;
            self.inner.set_destination(target);
        }
        fn destination(&self) -> Option<Vec3> { self.inner.destination() }
        fn remaining_distance(&self) -> f32 { self.inner.remaining_distance() }
        fn path_pending(&self) -> bool { self.inner.path_pending() }
        fn has_path(&self) -> bool { self.inner.has_path() }
        fn position(&self) -> Vec3 { self.inner.position() }
        fn reset_path(&mut self) { self.inner.reset_path() }
        fn speed(&self) -> f32 { self.inner.speed() }
        fn set_speed(&mut self, speed: f32) { self.inner.set_speed(speed) }
        fn stopping_distance(&self) -> f32 { self.inner.stopping_distance() }
        fn advance(&mut self, dt: f32) { self.inner.advance(dt) }
    }

    #[test]
    fn keepalive_reasserts_destination() {
        let mut w = World::new();
        let far = Vec3::ground(100.0, 0.0);
        w.place(far);
        let motion = Counting { inner: LinearMotion::new(Vec3::ZERO, 4.0), sets: 0 };
        let mut a = Agent::new(
            hv_core::AgentId(0),
            w.hub.id(),
            motion,
            hv_core::AgentRng::new(1, hv_core::AgentId(0)),
            &w.tuning,
            w.now(),
        );
        w.run_to(&mut a, SimTime(1_000));
        // Initial target plus keepalives at 0.5 s and 1.0 s.
        assert_eq!(a.motion().sets, 3);
        assert_eq!(a.motion().destination(), Some(far));
    }
}

// ── Removal ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod retire {
    use hv_core::Vec3;

    use super::helpers::World;
    use crate::{AgentEvent, TaskState};

    #[test]
    fn retire_releases_resource_reservation() {
        let mut w = World::new();
        let id = w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.step(&mut a);
        assert!(!w.pool.get(id).unwrap().is_free());

        assert_eq!(a.retire(&w.hub), vec![AgentEvent::Retired]);
        assert!(w.pool.get(id).unwrap().is_free());
        assert_eq!(a.target_id(), None);
        assert_eq!(a.state(), TaskState::Idle);
    }

    #[test]
    fn retire_releases_slot() {
        let mut w = World::new();
        w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 200, |e| matches!(e, AgentEvent::SlotGranted { .. }));
        assert_eq!(w.hub.busy_slots(), 1);

        a.retire(&w.hub);
        assert_eq!(w.hub.busy_slots(), 0);
        assert!(!a.is_carrying());
    }

    #[test]
    fn retire_after_sweep_does_not_touch_new_holder() {
        let mut w = World::with_slots(1);
        w.place(Vec3::ground(4.0, 0.0));
        let mut a = w.agent(0);
        w.run_until(&mut a, 200, |e| matches!(e, AgentEvent::SlotGranted { .. }));

        // The agent's slot is swept and re-leased to someone else.
        w.hub.free_slot(a.slot());
        let mut rng = hv_core::AgentRng::new(1, hv_core::AgentId(5));
        let other = w.hub.try_get_slot(w.now(), &w.surface, &mut rng).lease.unwrap();

        a.retire(&w.hub);
        assert!(w.hub.holds(&other));
    }
}
