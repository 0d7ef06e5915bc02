//! A collection point: slot ring, delivery counter and faction label.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use hv_core::time::secs_to_ms;
use hv_core::{AgentRng, HubId, SimTime, SlotConfig, SlotId, Vec3};
use hv_spatial::NavSurface;

use crate::slot_ring::{SlotGrant, SlotLease, SlotRing};
use crate::{HubError, HubResult};

/// Default number of docking slots per hub.
pub const DEFAULT_SLOTS: usize = 8;
/// Default slot ring radius.
pub const DEFAULT_RADIUS: f32 = 1.5;

// ── HubSpec ───────────────────────────────────────────────────────────────────

/// Static description of one hub, as loaded from config or CSV.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HubSpec {
    pub faction: String,
    pub center:  Vec3,
    pub slots:   usize,
    pub radius:  f32,
}

impl HubSpec {
    pub fn new(faction: impl Into<String>, center: Vec3) -> Self {
        Self { faction: faction.into(), center, slots: DEFAULT_SLOTS, radius: DEFAULT_RADIUS }
    }

    pub fn validate(&self) -> HubResult<()> {
        let max = (u16::MAX - 1) as usize;
        if self.slots == 0 || self.slots > max {
            return Err(HubError::SlotCount { faction: self.faction.clone(), got: self.slots, max });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(HubError::Radius { faction: self.faction.clone(), radius: self.radius });
        }
        Ok(())
    }
}

// ── Hub ───────────────────────────────────────────────────────────────────────

/// A hub shared by every agent that calls it home.
///
/// All methods take `&self`.  Slot operations lock this hub's ring only;
/// the store is a lock-free counter.
pub struct Hub {
    id:              HubId,
    faction:         String,
    center:          Vec3,
    radius:          f32,
    ring:            Mutex<SlotRing>,
    store:           AtomicU64,
    slot_timeout_ms: u64,
}

impl Hub {
    pub fn new(id: HubId, spec: &HubSpec, slots: &SlotConfig) -> HubResult<Self> {
        spec.validate()?;
        // Validated above to fit below `u16::MAX`.
        let count = spec.slots as u16;
        Ok(Self {
            id,
            faction:         spec.faction.clone(),
            center:          spec.center,
            radius:          spec.radius,
            ring:            Mutex::new(SlotRing::new(
                spec.center,
                spec.radius,
                count,
                slots.fallback,
                slots.snap_distance,
            )),
            store:           AtomicU64::new(0),
            slot_timeout_ms: secs_to_ms(slots.timeout_secs),
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> HubId {
        self.id
    }

    #[inline]
    pub fn faction(&self) -> &str {
        &self.faction
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn slot_count(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn busy_slots(&self) -> usize {
        self.ring.lock().busy_count()
    }

    pub fn is_slot_busy(&self, id: SlotId) -> bool {
        self.ring.lock().is_busy(id)
    }

    pub fn holds(&self, lease: &SlotLease) -> bool {
        self.ring.lock().holds(lease)
    }

    pub fn slot_timeout_ms(&self) -> u64 {
        self.slot_timeout_ms
    }

    pub fn set_slot_timeout(&mut self, secs: f32) {
        self.slot_timeout_ms = secs_to_ms(secs);
    }

    // ── Store ─────────────────────────────────────────────────────────────

    /// Accumulated deliveries.  Only ever increases.
    #[inline]
    pub fn store(&self) -> u64 {
        self.store.load(Ordering::Acquire)
    }

    /// Credit one delivery; returns the new total.
    pub fn deposit(&self) -> u64 {
        self.store.fetch_add(1, Ordering::AcqRel) + 1
    }

    // ── Slots ─────────────────────────────────────────────────────────────

    pub fn try_get_slot(&self, now: SimTime, surface: &dyn NavSurface, rng: &mut AgentRng) -> SlotGrant {
        let grant = self.ring.lock().try_get_slot(now, surface, rng);
        if !grant.ok() {
            debug!(hub = %self.id, position = %grant.position, "all slots busy, using fallback");
        }
        grant
    }

    pub fn free_slot(&self, id: SlotId) {
        self.ring.lock().free_slot(id);
    }

    pub fn release(&self, lease: &SlotLease) -> bool {
        self.ring.lock().release(lease)
    }

    /// Run the stale-reservation sweep with this hub's timeout.
    pub fn reclaim_stale(&self, now: SimTime) -> usize {
        let n = self.ring.lock().reclaim_stale(now, self.slot_timeout_ms);
        if n > 0 {
            debug!(hub = %self.id, reclaimed = n, "stale slot reservations reclaimed");
        }
        n
    }

    /// Raw anchor of every slot, in index order.
    pub fn slot_anchors(&self) -> Vec<Vec3> {
        let ring = self.ring.lock();
        (0..ring.len())
            .filter_map(|i| ring.anchor(SlotId(i as u16)))
            .collect()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.id)
            .field("faction", &self.faction)
            .field("center", &self.center)
            .field("store", &self.store())
            .finish()
    }
}
