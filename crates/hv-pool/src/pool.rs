//! The replenished pool of resource nodes.
//!
//! # Ownership
//!
//! The pool owns every node it spawns (`Arc<ResourceNode>`; leases share
//! the `Arc`).  Mutation of the node list (`tick`, `spawn`, `set_interval`)
//! takes `&mut self` and runs in the coordinator's sequential phase.
//! Matching (`nearest_free`) takes `&self` and may run from many agents at
//! once; it only touches the nodes' atomic state words.

use std::sync::Arc;

use tracing::{debug, info, trace};

use hv_core::config::MIN_SPAWN_INTERVAL_SECS;
use hv_core::time::secs_to_ms;
use hv_core::{PeriodicTimer, PoolConfig, ResourceId, SimRng, SimTime, Vec3};
use hv_spatial::NavSurface;

use crate::node::{ResourceLease, ResourceNode};

/// What one [`ResourcePool::tick`] did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolTick {
    /// The node created by this tick's spawn attempt, if any.
    pub spawned:   Option<ResourceId>,
    /// Stale reservations returned to `Free`.
    pub reclaimed: usize,
}

/// Bounded, timer-driven collection of resource nodes.
pub struct ResourcePool {
    nodes:       Vec<Arc<ResourceNode>>,
    capacity:    usize,
    timer:       PeriodicTimer,
    center:      Vec3,
    half_extent: [f32; 2],
    snap:        f32,
    /// `None` disables the stale-reservation sweep.
    reservation_timeout_ms: Option<u64>,
    next_id:     u32,
}

impl ResourcePool {
    /// Build an empty pool.  The first spawn is due at `SimTime::ZERO`.
    pub fn new(cfg: &PoolConfig) -> Self {
        let interval = cfg.spawn_interval_secs.max(MIN_SPAWN_INTERVAL_SECS);
        Self {
            nodes:       Vec::with_capacity(cfg.capacity),
            capacity:    cfg.capacity,
            timer:       PeriodicTimer::immediate(secs_to_ms(interval), SimTime::ZERO),
            center:      cfg.spawn_center,
            half_extent: cfg.spawn_half_extent,
            snap:        cfg.spawn_snap_distance,
            reservation_timeout_ms: cfg.reservation_timeout_secs.map(secs_to_ms),
            next_id:     0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current spawn interval in seconds.
    pub fn interval_secs(&self) -> f32 {
        self.timer.period_ms() as f32 / 1000.0
    }

    /// Every node still in the list, including ones deactivated since the
    /// last purge.
    pub fn nodes(&self) -> &[Arc<ResourceNode>] {
        &self.nodes
    }

    pub fn get(&self, id: ResourceId) -> Option<&Arc<ResourceNode>> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_live()).count()
    }

    pub fn free_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_live() && n.is_free()).count()
    }

    // ── Tuning ────────────────────────────────────────────────────────────

    /// Change the spawn interval (clamped to the minimum) and restart the
    /// timer.  The next spawn attempt happens on the first tick at or after
    /// `now`.
    pub fn set_interval(&mut self, secs: f32, now: SimTime) {
        let secs = if secs.is_finite() { secs.max(MIN_SPAWN_INTERVAL_SECS) } else { MIN_SPAWN_INTERVAL_SECS };
        self.timer.restart(secs_to_ms(secs), now);
        info!(interval_secs = secs, "spawn interval changed");
    }

    pub fn set_reservation_timeout(&mut self, timeout_secs: Option<f32>) {
        self.reservation_timeout_ms = timeout_secs.map(secs_to_ms);
    }

    // ── Per-tick maintenance ─────────────────────────────────────────────

    /// Run the spawn timer and the stale-reservation sweep for one tick.
    pub fn tick(&mut self, now: SimTime, surface: &dyn NavSurface, rng: &mut SimRng) -> PoolTick {
        let spawned = if self.timer.poll(now) { self.spawn(now, surface, rng) } else { None };
        let reclaimed = match self.reservation_timeout_ms {
            Some(timeout) => self.reclaim_stale(now, timeout),
            None => 0,
        };
        PoolTick { spawned, reclaimed }
    }

    /// One spawn attempt.
    ///
    /// Purges nodes that are no longer live, then, if there is room, draws a
    /// point uniformly from the spawn rectangle and asks `surface` to place
    /// it.  A rejected placement is dropped for this attempt.
    pub fn spawn(&mut self, now: SimTime, surface: &dyn NavSurface, rng: &mut SimRng) -> Option<ResourceId> {
        self.purge();
        if self.nodes.len() >= self.capacity {
            trace!(live = self.nodes.len(), "pool at capacity, spawn skipped");
            return None;
        }

        let [hx, hz] = self.half_extent;
        let raw = Vec3::new(
            self.center.x + rng.gen_range(-hx..=hx),
            self.center.y,
            self.center.z + rng.gen_range(-hz..=hz),
        );
        let Some(pos) = surface.sample(raw, self.snap) else {
            debug!(%raw, "spawn position rejected by surface");
            return None;
        };

        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.nodes.push(Arc::new(ResourceNode::new(id, pos)));
        trace!(resource = %id, %pos, %now, "resource spawned");
        Some(id)
    }

    /// Drop nodes that are no longer live.  Returns how many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.is_live());
        before - self.nodes.len()
    }

    /// Return every reservation older than `timeout_ms` to `Free`.
    pub fn reclaim_stale(&self, now: SimTime, timeout_ms: u64) -> usize {
        let mut n = 0;
        for node in &self.nodes {
            if node.is_live() && node.reclaim_if_stale(now, timeout_ms) {
                debug!(resource = %node.id(), "stale resource reservation reclaimed");
                n += 1;
            }
        }
        n
    }

    /// Take a node out of play from outside the scheduling core.  Any
    /// outstanding lease on it stops being held.
    pub fn invalidate(&self, id: ResourceId) -> bool {
        match self.get(id) {
            Some(node) if node.is_live() => {
                node.deactivate();
                debug!(resource = %id, "resource invalidated");
                true
            }
            _ => false,
        }
    }

    // ── Matching ──────────────────────────────────────────────────────────

    /// Reserve the nearest live, free node to `from`.
    ///
    /// Candidates are ordered by squared distance, ties in pool order.  The
    /// first candidate whose reservation CAS succeeds is returned; losing a
    /// race moves on to the next candidate.  At most one node is reserved
    /// per call.
    pub fn nearest_free(&self, from: Vec3, now: SimTime) -> Option<ResourceLease> {
        let mut candidates: Vec<(f32, &Arc<ResourceNode>)> = self
            .nodes
            .iter()
            .filter(|n| n.is_live() && n.is_free())
            .map(|n| (n.position().distance_sq(from), n))
            .collect();
        // Stable sort keeps pool order for equal distances.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, node) in candidates {
            if let Some(lease) = node.try_reserve_at(now) {
                return Some(lease);
            }
            trace!(resource = %node.id(), "lost reservation race, trying next");
        }
        None
    }
}

impl std::fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("live", &self.live_count())
            .field("free", &self.free_count())
            .field("capacity", &self.capacity)
            .field("interval_ms", &self.timer.period_ms())
            .finish()
    }
}
