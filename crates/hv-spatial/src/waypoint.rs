//! Navigable surface approximated by a cloud of sample points.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over the `(x, z)` ground projection of every
//! waypoint.  `sample` is a single nearest-neighbour query followed by a
//! distance check against `max_snap`, so a raw point snaps to the closest
//! known walkable position or is rejected.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use hv_core::Vec3;

use crate::surface::NavSurface;
use crate::{SpatialError, SpatialResult};

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: the `[x, z]` projection plus the full point.
#[derive(Clone)]
struct WaypointEntry {
    point: [f32; 2], // [x, z]
    pos:   Vec3,
}

impl RTreeObject for WaypointEntry {
    type Envelope = AABB<[f32; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for WaypointEntry {
    /// Squared ground-plane distance.
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.point[0] - point[0];
        let dz = self.point[1] - point[1];
        dx * dx + dz * dz
    }
}

// ── WaypointSurface ───────────────────────────────────────────────────────────

/// A walkable surface known only through discrete sample points.
///
/// Do not construct directly; use [`WaypointSurfaceBuilder`].
pub struct WaypointSurface {
    spatial_idx: RTree<WaypointEntry>,
}

impl WaypointSurface {
    pub fn len(&self) -> usize {
        self.spatial_idx.size()
    }

    pub fn is_empty(&self) -> bool {
        self.spatial_idx.size() == 0
    }

    /// Nearest waypoint to `pos`, ignoring height.
    pub fn nearest(&self, pos: Vec3) -> Option<Vec3> {
        self.spatial_idx.nearest_neighbor(&[pos.x, pos.z]).map(|e| e.pos)
    }

    /// Up to `k` waypoints nearest to `pos`, sorted by ascending distance.
    pub fn k_nearest(&self, pos: Vec3, k: usize) -> Vec<Vec3> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.x, pos.z])
            .take(k)
            .map(|e| e.pos)
            .collect()
    }
}

impl NavSurface for WaypointSurface {
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
        if !(raw.x.is_finite() && raw.z.is_finite()) {
            return None;
        }
        let max_2 = max_snap * max_snap;
        self.spatial_idx
            .nearest_neighbor(&[raw.x, raw.z])
            .filter(|e| e.distance_2(&[raw.x, raw.z]) <= max_2)
            .map(|e| e.pos)
    }
}

// ── WaypointSurfaceBuilder ────────────────────────────────────────────────────

/// Collect waypoints, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use hv_core::Vec3;
/// use hv_spatial::{NavSurface, WaypointSurfaceBuilder};
///
/// let mut b = WaypointSurfaceBuilder::new();
/// b.add_grid(Vec3::ZERO, 2, 1.0);
/// let surface = b.build().unwrap();
/// assert_eq!(surface.len(), 25);
/// assert!(surface.sample(Vec3::ground(0.4, 0.0), 0.5).is_some());
/// ```
#[derive(Default)]
pub struct WaypointSurfaceBuilder {
    points: Vec<Vec3>,
}

impl WaypointSurfaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self { points: Vec::with_capacity(n) }
    }

    pub fn add_point(&mut self, p: Vec3) -> &mut Self {
        self.points.push(p);
        self
    }

    /// Add a square lattice of `(2·half_cells + 1)²` points spaced `spacing`
    /// apart around `center`.
    pub fn add_grid(&mut self, center: Vec3, half_cells: u32, spacing: f32) -> &mut Self {
        let n = half_cells as i64;
        for i in -n..=n {
            for j in -n..=n {
                self.points.push(Vec3::new(
                    center.x + i as f32 * spacing,
                    center.y,
                    center.z + j as f32 * spacing,
                ));
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bulk-load the R-tree.  Fails if no points were added or any point
    /// has a non-finite coordinate.
    pub fn build(self) -> SpatialResult<WaypointSurface> {
        if self.points.is_empty() {
            return Err(SpatialError::NoWaypoints);
        }
        if self
            .points
            .iter()
            .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
        {
            return Err(SpatialError::NonFinite);
        }
        let entries = self
            .points
            .into_iter()
            .map(|pos| WaypointEntry { point: [pos.x, pos.z], pos })
            .collect();
        Ok(WaypointSurface { spatial_idx: RTree::bulk_load(entries) })
    }
}
