//! Unit tests for hv-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, HubId, ResourceId, SlotId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(ResourceId::INVALID.0, u32::MAX);
        assert_eq!(SlotId::INVALID.0, u16::MAX);
        assert!(!SlotId::default().is_valid());
        assert!(SlotId(0).is_valid());
    }

    #[test]
    fn slot_id_out_of_range_conversion_fails() {
        assert!(SlotId::try_from(70_000usize).is_err());
        assert_eq!(HubId::try_from(3usize).unwrap(), HubId(3));
    }

    #[test]
    fn display() {
        assert_eq!(HubId(1).to_string(), "HubId(1)");
    }
}

#[cfg(test)]
mod geo {
    use std::f32::consts::PI;

    use crate::Vec3;

    #[test]
    fn squared_distance() {
        let a = Vec3::ground(0.0, 0.0);
        let b = Vec3::ground(3.0, 4.0);
        assert_eq!(a.distance_sq(b), 25.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn xz_distance_ignores_height() {
        let a = Vec3::new(1.0, 5.0, 1.0);
        let b = Vec3::new(1.0, 0.0, 2.0);
        assert_eq!(a.distance_sq_xz(b), 1.0);
    }

    #[test]
    fn ring_points() {
        let c = Vec3::ground(2.0, -1.0);
        let p0 = Vec3::on_ring(c, 1.5, 0.0);
        assert!((p0.x - 3.5).abs() < 1e-5 && (p0.z + 1.0).abs() < 1e-5);
        let p1 = Vec3::on_ring(c, 1.5, PI / 2.0);
        assert!((p1.x - 2.0).abs() < 1e-5 && (p1.z - 0.5).abs() < 1e-5);
    }

    #[test]
    fn normalized_zero_is_zero() {
        assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
        let n = Vec3::new(0.0, 0.0, 2.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}

#[cfg(test)]
mod time {
    use crate::{PeriodicTimer, SimClock, SimTime, Tick};

    #[test]
    fn clock_maps_ticks_to_millis() {
        let mut clock = SimClock::new(50);
        assert_eq!(clock.now(), SimTime::ZERO);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.now(), SimTime(100));
        assert!((clock.dt_secs() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn secs_conversion_rounds_and_clamps() {
        assert_eq!(SimTime::from_secs_f32(3.1), SimTime(3100));
        assert_eq!(SimTime::from_secs_f32(-1.0), SimTime(0));
        assert_eq!(SimTime::from_secs_f32(f32::NAN), SimTime(0));
    }

    #[test]
    fn immediate_timer_fires_at_start_then_every_period() {
        let mut t = PeriodicTimer::immediate(1000, SimTime(0));
        assert!(t.poll(SimTime(0)));
        assert!(!t.poll(SimTime(500)));
        assert!(!t.poll(SimTime(999)));
        assert!(t.poll(SimTime(1000)));
        assert!(!t.poll(SimTime(1000)));
    }

    #[test]
    fn after_period_timer_waits() {
        let mut t = PeriodicTimer::after_period(500, SimTime(100));
        assert!(!t.poll(SimTime(100)));
        assert!(t.poll(SimTime(600)));
    }

    #[test]
    fn missed_periods_are_not_replayed() {
        let mut t = PeriodicTimer::immediate(100, SimTime(0));
        assert!(t.poll(SimTime(0)));
        assert!(t.poll(SimTime(1050)));
        assert!(!t.poll(SimTime(1050)));
        assert_eq!(t.next_due(), SimTime(1100));
    }

    #[test]
    fn restart_fires_on_next_poll() {
        let mut t = PeriodicTimer::immediate(3000, SimTime(0));
        assert!(t.poll(SimTime(0)));
        t.restart(200, SimTime(700));
        assert!(t.poll(SimTime(700)));
        assert!(t.poll(SimTime(900)));
        assert_eq!(t.period_ms(), 200);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::new(12345, AgentId(0));
        let mut r2 = AgentRng::new(12345, AgentId(0));
        for _ in 0..100 {
            let a: f32 = r1.gen_range(0.0..1.0);
            let b: f32 = r2.gen_range(0.0..1.0);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_agents_differ() {
        let mut r0 = AgentRng::new(1, AgentId(0));
        let mut r1 = AgentRng::new(1, AgentId(1));
        let a: u64 = r0.gen_range(0..u64::MAX);
        let b: u64 = r1.gen_range(0..u64::MAX);
        assert_ne!(a, b, "seeds for adjacent agents should diverge");
    }

    #[test]
    fn sim_rng_range_in_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let v = rng.gen_range(-10.0f32..=10.0);
            assert!((-10.0..=10.0).contains(&v));
        }
    }
}

#[cfg(test)]
mod config {
    use crate::{HvError, SimConfig};

    #[test]
    fn defaults_are_valid() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_tick_duration_rejected() {
        let cfg = SimConfig { tick_duration_ms: 0, ..SimConfig::default() };
        assert!(matches!(cfg.validate(), Err(HvError::Config(_))));
    }

    #[test]
    fn population_out_of_range_rejected() {
        let cfg = SimConfig { agents_per_hub: 11, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = SimConfig { agents_per_hub: 0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_positive_durations_rejected() {
        let mut cfg = SimConfig::default();
        cfg.slots.timeout_secs = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.pool.reservation_timeout_secs = Some(-1.0);
        assert!(cfg.validate().is_err());

        let mut cfg = SimConfig::default();
        cfg.pool.reservation_timeout_secs = None;
        assert!(cfg.validate().is_ok());
    }
}
