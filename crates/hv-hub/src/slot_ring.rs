//! Fixed-size ring of leasable docking slots around a hub.
//!
//! # Reservation lifetime
//!
//! A reservation is released in one of three ways:
//!
//! | Path                       | Who calls it                               |
//! |----------------------------|--------------------------------------------|
//! | [`SlotRing::release`]      | the holder, with its [`SlotLease`]          |
//! | [`SlotRing::free_slot`]    | anyone, by index (unconditional)            |
//! | [`SlotRing::reclaim_stale`]| the per-tick sweep, once the stamp expires |
//!
//! The sweep never depends on the holder: an agent that was removed or got
//! stuck cannot strand a slot for longer than the timeout.
//!
//! `SlotRing` itself is plain data; [`Hub`](crate::Hub) wraps it in a mutex.

use std::f32::consts::TAU;

use hv_core::{AgentRng, FallbackPolicy, SimTime, SlotId, Vec3};
use hv_spatial::NavSurface;

#[derive(Clone, Debug)]
struct Slot {
    anchor:      Vec3,
    busy:        bool,
    reserved_at: SimTime,
    /// Bumped on every reservation; a lease matches only its own epoch.
    epoch:       u64,
}

/// Proof of one specific slot reservation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SlotLease {
    id:    SlotId,
    epoch: u64,
}

impl SlotLease {
    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }
}

/// Result of [`SlotRing::try_get_slot`].
///
/// Always carries a position to head for.  `lease` is `None` when every
/// slot was busy; the caller proceeds without a guaranteed slot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SlotGrant {
    pub position: Vec3,
    pub lease:    Option<SlotLease>,
}

impl SlotGrant {
    /// `true` if a slot was actually reserved.
    #[inline]
    pub fn ok(&self) -> bool {
        self.lease.is_some()
    }

    /// The reserved slot, or `SlotId::INVALID`.
    #[inline]
    pub fn id(&self) -> SlotId {
        self.lease.map_or(SlotId::INVALID, |l| l.id)
    }
}

// ── SlotRing ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SlotRing {
    center:     Vec3,
    radius:     f32,
    slots:      Vec<Slot>,
    fallback:   FallbackPolicy,
    snap:       f32,
    next_epoch: u64,
}

impl SlotRing {
    /// `count` slots evenly spaced on a circle of `radius` around `center`.
    /// Slot `i` sits at angle `2π·i/count`, measured from `+x` towards `+z`.
    pub fn new(center: Vec3, radius: f32, count: u16, fallback: FallbackPolicy, snap: f32) -> Self {
        let slots = (0..count)
            .map(|i| Slot {
                anchor:      Vec3::on_ring(center, radius, TAU * i as f32 / count as f32),
                busy:        false,
                reserved_at: SimTime::ZERO,
                epoch:       0,
            })
            .collect();
        Self { center, radius, slots, fallback, snap, next_epoch: 1 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn busy_count(&self) -> usize {
        self.slots.iter().filter(|s| s.busy).count()
    }

    pub fn is_busy(&self, id: SlotId) -> bool {
        self.slots.get(id.index()).is_some_and(|s| s.busy)
    }

    /// Raw (unsnapped) anchor of slot `id`.
    pub fn anchor(&self, id: SlotId) -> Option<Vec3> {
        self.slots.get(id.index()).map(|s| s.anchor)
    }

    pub fn reserved_at(&self, id: SlotId) -> Option<SimTime> {
        self.slots.get(id.index()).filter(|s| s.busy).map(|s| s.reserved_at)
    }

    /// `true` while `lease` is the slot's current reservation.
    pub fn holds(&self, lease: &SlotLease) -> bool {
        self.slots
            .get(lease.id.index())
            .is_some_and(|s| s.busy && s.epoch == lease.epoch)
    }

    // ── Leasing ───────────────────────────────────────────────────────────

    /// Reserve the lowest-index free slot.
    ///
    /// The returned position is the slot anchor snapped onto `surface`
    /// within the ring's snap distance, or the raw anchor if sampling
    /// fails.  With every slot busy, the position comes from the fallback
    /// policy and no lease is issued.
    pub fn try_get_slot(&mut self, now: SimTime, surface: &dyn NavSurface, rng: &mut AgentRng) -> SlotGrant {
        let Some(i) = self.slots.iter().position(|s| !s.busy) else {
            return SlotGrant { position: self.fallback_position(rng), lease: None };
        };

        let epoch = self.next_epoch;
        self.next_epoch += 1;
        let slot = &mut self.slots[i];
        slot.busy = true;
        slot.reserved_at = now;
        slot.epoch = epoch;

        let position = surface.sample(slot.anchor, self.snap).unwrap_or(slot.anchor);
        // `i < count <= u16::MAX`, so the index always fits.
        let id = SlotId(i as u16);
        SlotGrant { position, lease: Some(SlotLease { id, epoch }) }
    }

    /// Mark slot `id` free.  No-op for `SlotId::INVALID` or an unknown id.
    pub fn free_slot(&mut self, id: SlotId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.busy = false;
        }
    }

    /// Free the slot only if `lease` is still its current reservation.
    pub fn release(&mut self, lease: &SlotLease) -> bool {
        match self.slots.get_mut(lease.id.index()) {
            Some(slot) if slot.busy && slot.epoch == lease.epoch => {
                slot.busy = false;
                true
            }
            _ => false,
        }
    }

    /// Free every slot whose reservation is strictly older than
    /// `timeout_ms`.  Returns the number freed.
    pub fn reclaim_stale(&mut self, now: SimTime, timeout_ms: u64) -> usize {
        let mut n = 0;
        for slot in self.slots.iter_mut() {
            if slot.busy && now.saturating_since(slot.reserved_at) > timeout_ms {
                slot.busy = false;
                n += 1;
            }
        }
        n
    }

    fn fallback_position(&self, rng: &mut AgentRng) -> Vec3 {
        match self.fallback {
            FallbackPolicy::HubCenter => self.center,
            FallbackPolicy::RandomOnRing => {
                Vec3::on_ring(self.center, self.radius, rng.gen_range(0.0..TAU))
            }
        }
    }
}
