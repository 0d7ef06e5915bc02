//! Unit tests for hv-hub.

#[cfg(test)]
mod helpers {
    use hv_core::{AgentId, AgentRng, FallbackPolicy, Vec3};
    use hv_spatial::OpenGround;

    use crate::SlotRing;

    pub fn ring(n: u16) -> SlotRing {
        SlotRing::new(Vec3::ZERO, 1.5, n, FallbackPolicy::HubCenter, 0.5)
    }

    pub fn rng() -> AgentRng {
        AgentRng::new(99, AgentId(0))
    }

    pub fn ground() -> OpenGround {
        OpenGround::unbounded()
    }
}

// ── SlotRing ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod slot_ring {
    use std::f32::consts::{FRAC_1_SQRT_2, PI};

    use hv_core::{FallbackPolicy, SimTime, SlotId, Vec3};
    use hv_spatial::{NavSurface, OpenGround};

    use super::helpers::{ground, ring, rng};
    use crate::SlotRing;

    #[test]
    fn grants_in_index_order() {
        let mut r = ring(4);
        let mut rng = rng();
        for i in 0..4u16 {
            let g = r.try_get_slot(SimTime(0), &ground(), &mut rng);
            assert!(g.ok());
            assert_eq!(g.id(), SlotId(i));
        }
        assert_eq!(r.busy_count(), 4);
    }

    #[test]
    fn anchors_lie_on_ring() {
        let r = SlotRing::new(Vec3::ground(10.0, 0.0), 2.0, 8, FallbackPolicy::HubCenter, 0.5);
        let a0 = r.anchor(SlotId(0)).unwrap();
        assert!((a0.x - 12.0).abs() < 1e-5 && a0.z.abs() < 1e-5);
        let a1 = r.anchor(SlotId(1)).unwrap();
        assert!((a1.x - (10.0 + 2.0 * FRAC_1_SQRT_2)).abs() < 1e-4);
        assert!((a1.z - 2.0 * FRAC_1_SQRT_2).abs() < 1e-4);
        let a4 = r.anchor(SlotId(4)).unwrap();
        assert!((a4.x - (10.0 + 2.0 * PI.cos())).abs() < 1e-4);
        assert_eq!(r.anchor(SlotId(8)), None);
    }

    #[test]
    fn full_ring_falls_back_to_center() {
        let mut r = ring(2);
        let mut rng = rng();
        r.try_get_slot(SimTime(0), &ground(), &mut rng);
        r.try_get_slot(SimTime(0), &ground(), &mut rng);
        let g = r.try_get_slot(SimTime(0), &ground(), &mut rng);
        assert!(!g.ok());
        assert_eq!(g.id(), SlotId::INVALID);
        assert_eq!(g.position, Vec3::ZERO);
        assert_eq!(r.busy_count(), 2);
    }

    #[test]
    fn random_on_ring_fallback() {
        let mut r = SlotRing::new(Vec3::ZERO, 1.5, 1, FallbackPolicy::RandomOnRing, 0.5);
        let mut rng = rng();
        r.try_get_slot(SimTime(0), &ground(), &mut rng);
        for _ in 0..20 {
            let g = r.try_get_slot(SimTime(0), &ground(), &mut rng);
            assert!(!g.ok());
            assert!((g.position.length() - 1.5).abs() < 1e-4);
        }
    }

    #[test]
    fn free_slot_sentinel_and_out_of_range_are_noops() {
        let mut r = ring(2);
        let mut rng = rng();
        r.try_get_slot(SimTime(0), &ground(), &mut rng);
        r.free_slot(SlotId::INVALID);
        r.free_slot(SlotId(7));
        assert_eq!(r.busy_count(), 1);
        r.free_slot(SlotId(0));
        assert_eq!(r.busy_count(), 0);
    }

    #[test]
    fn busy_never_exceeds_len_and_free_iff_available() {
        let mut r = ring(3);
        let mut rng = rng();
        let mut held: Vec<SlotId> = Vec::new();
        // Deterministic interleaving of gets and frees.
        for step in 0..60u32 {
            if step % 3 == 2 && !held.is_empty() {
                let id = held.remove((step as usize) % held.len());
                r.free_slot(id);
            } else {
                let had_free = r.busy_count() < r.len();
                let g = r.try_get_slot(SimTime(step as u64), &ground(), &mut rng);
                assert_eq!(g.ok(), had_free);
                if g.ok() {
                    held.push(g.id());
                }
            }
            assert!(r.busy_count() <= r.len());
            assert_eq!(r.busy_count(), held.len());
        }
    }

    #[test]
    fn two_slot_timeout_scenario() {
        let mut r = ring(2);
        let mut rng = rng();
        let timeout_ms = 3_000;

        let a = r.try_get_slot(SimTime(0), &ground(), &mut rng);
        assert_eq!(a.id(), SlotId(0));

        // Not reclaimed before the timeout has passed.
        assert_eq!(r.reclaim_stale(SimTime(2_900), timeout_ms), 0);
        assert_eq!(r.reclaim_stale(SimTime(3_000), timeout_ms), 0);
        assert!(r.is_busy(SlotId(0)));

        assert_eq!(r.reclaim_stale(SimTime(3_100), timeout_ms), 1);
        assert!(!r.is_busy(SlotId(0)));

        let b = r.try_get_slot(SimTime(3_200), &ground(), &mut rng);
        assert_eq!(b.id(), SlotId(0));
        assert_eq!(r.reserved_at(SlotId(0)), Some(SimTime(3_200)));
    }

    #[test]
    fn stale_lease_cannot_release_new_holder() {
        let mut r = ring(1);
        let mut rng = rng();
        let first = r.try_get_slot(SimTime(0), &ground(), &mut rng).lease.unwrap();
        r.reclaim_stale(SimTime(5_000), 3_000);
        let second = r.try_get_slot(SimTime(5_000), &ground(), &mut rng).lease.unwrap();
        assert_eq!(first.id(), second.id());
        assert!(!r.holds(&first));
        assert!(!r.release(&first));
        assert!(r.is_busy(SlotId(0)));
        assert!(r.release(&second));
        assert!(!r.is_busy(SlotId(0)));
    }

    /// Accepts only points within 0.1 of the `x` axis.
    struct XAxis;
    impl NavSurface for XAxis {
        fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
            (raw.z.abs() <= max_snap).then(|| Vec3::ground(raw.x, 0.0))
        }
    }

    #[test]
    fn anchor_refined_by_surface_with_raw_fallback() {
        let mut r = ring(4);
        let mut rng = rng();
        // Slot 0 at angle 0 lies on the axis and snaps onto it.
        let g0 = r.try_get_slot(SimTime(0), &XAxis, &mut rng);
        assert_eq!(g0.position, Vec3::ground(1.5, 0.0));
        // Slot 1 at π/2 is 1.5 off the axis: out of snap range, raw anchor used.
        let g1 = r.try_get_slot(SimTime(0), &XAxis, &mut rng);
        assert_eq!(Some(g1.position), r.anchor(SlotId(1)));

        let strip = OpenGround::new(-10.0, -0.2, 10.0, 0.2).unwrap();
        let g2 = r.try_get_slot(SimTime(0), &strip, &mut rng);
        assert!((g2.position.x + 1.5).abs() < 1e-4);
    }
}

// ── Hub ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod hub {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use hv_core::{AgentId, AgentRng, HubId, SimTime, SlotConfig, Vec3};

    use super::helpers::ground;
    use crate::{Hub, HubError, HubSpec};

    fn hub(slots: usize) -> Hub {
        let mut spec = HubSpec::new("Blue", Vec3::ground(5.0, 5.0));
        spec.slots = slots;
        Hub::new(HubId(0), &spec, &SlotConfig::default()).unwrap()
    }

    #[test]
    fn spec_defaults() {
        let spec = HubSpec::new("Red", Vec3::ZERO);
        assert_eq!(spec.slots, 8);
        assert_eq!(spec.radius, 1.5);
        spec.validate().unwrap();
    }

    #[test]
    fn invalid_specs_rejected() {
        let mut spec = HubSpec::new("Red", Vec3::ZERO);
        spec.slots = 0;
        assert!(matches!(spec.validate(), Err(HubError::SlotCount { .. })));
        let mut spec = HubSpec::new("Red", Vec3::ZERO);
        spec.radius = -1.0;
        assert!(matches!(spec.validate(), Err(HubError::Radius { .. })));
    }

    #[test]
    fn deposit_is_monotonic() {
        let h = hub(8);
        assert_eq!(h.store(), 0);
        assert_eq!(h.deposit(), 1);
        assert_eq!(h.deposit(), 2);
        assert_eq!(h.store(), 2);
        assert_eq!(h.faction(), "Blue");
    }

    #[test]
    fn concurrent_slot_requests_never_share() {
        let h = hub(4);
        let granted = AtomicUsize::new(0);
        std::thread::scope(|s| {
            for t in 0..16u32 {
                let h = &h;
                let granted = &granted;
                s.spawn(move || {
                    let mut rng = AgentRng::new(1, AgentId(t));
                    if h.try_get_slot(SimTime(0), &ground(), &mut rng).ok() {
                        granted.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        assert_eq!(granted.load(Ordering::Relaxed), 4);
        assert_eq!(h.busy_slots(), 4);
    }

    #[test]
    fn sweep_uses_configured_timeout() {
        let h = hub(2);
        let mut rng = AgentRng::new(1, AgentId(0));
        let lease = h.try_get_slot(SimTime(0), &ground(), &mut rng).lease.unwrap();
        assert_eq!(h.reclaim_stale(SimTime(3_000)), 0);
        assert!(h.holds(&lease));
        assert_eq!(h.reclaim_stale(SimTime(3_050)), 1);
        assert!(!h.holds(&lease));
        assert_eq!(h.busy_slots(), 0);
    }

    #[test]
    fn slot_anchors_match_count() {
        let h = hub(6);
        let anchors = h.slot_anchors();
        assert_eq!(anchors.len(), 6);
        for a in anchors {
            assert!((a.distance(h.center()) - h.radius()).abs() < 1e-4);
        }
    }
}
