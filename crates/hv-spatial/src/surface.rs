//! The navigable-surface query interface.
//!
//! # Contract
//!
//! `sample(raw, max_snap)` returns the closest navigable point to `raw` if
//! one exists within `max_snap` units, and `None` otherwise.  Callers decide
//! what `None` means: the resource pool drops that spawn attempt, the slot
//! ring falls back to the raw anchor.
//!
//! # Thread safety
//!
//! Implementations must be `Send + Sync`: agents sample the surface from
//! Rayon workers when the `parallel` feature of `hv-sim` is enabled.

use std::sync::Arc;

use hv_core::Vec3;

use crate::{SpatialError, SpatialResult};

// ── NavSurface trait ──────────────────────────────────────────────────────────

/// Snaps raw world positions onto the walkable surface.
pub trait NavSurface: Send + Sync {
    /// Closest navigable point within `max_snap` of `raw`, or `None`.
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3>;

    /// `true` if `p` is already on the surface (zero snap distance).
    fn contains(&self, p: Vec3) -> bool {
        self.sample(p, 0.0).is_some()
    }
}

impl<T: NavSurface + ?Sized> NavSurface for &T {
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
        (**self).sample(raw, max_snap)
    }
}

impl<T: NavSurface + ?Sized> NavSurface for Arc<T> {
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
        (**self).sample(raw, max_snap)
    }
}

impl<T: NavSurface + ?Sized> NavSurface for Box<T> {
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
        (**self).sample(raw, max_snap)
    }
}

// ── OpenGround ────────────────────────────────────────────────────────────────

/// A flat, obstacle-free rectangle on the plane `y = height`.
///
/// Points inside the rectangle are returned unchanged (with `y` set to the
/// ground height).  Points outside are clamped to the nearest edge, and the
/// clamped point is accepted only if it lies within `max_snap` of `raw`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenGround {
    pub min_x:  f32,
    pub min_z:  f32,
    pub max_x:  f32,
    pub max_z:  f32,
    pub height: f32,
}

impl OpenGround {
    /// A rectangle spanning `[min_x, max_x] × [min_z, max_z]` at `y = 0`.
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> SpatialResult<Self> {
        if ![min_x, min_z, max_x, max_z].iter().all(|v| v.is_finite()) {
            return Err(SpatialError::NonFinite);
        }
        if min_x > max_x || min_z > max_z {
            return Err(SpatialError::InvalidBounds { min_x, min_z, max_x, max_z });
        }
        Ok(Self { min_x, min_z, max_x, max_z, height: 0.0 })
    }

    /// A square of half-width `half_extent` centred on `center`.
    pub fn centered(center: Vec3, half_extent: f32) -> SpatialResult<Self> {
        let mut g = Self::new(
            center.x - half_extent,
            center.z - half_extent,
            center.x + half_extent,
            center.z + half_extent,
        )?;
        g.height = center.y;
        Ok(g)
    }

    /// Ground with no edges.  Every sample succeeds.
    pub fn unbounded() -> Self {
        Self {
            min_x:  f32::NEG_INFINITY,
            min_z:  f32::NEG_INFINITY,
            max_x:  f32::INFINITY,
            max_z:  f32::INFINITY,
            height: 0.0,
        }
    }

    #[inline]
    fn clamp(&self, raw: Vec3) -> Vec3 {
        Vec3::new(
            raw.x.clamp(self.min_x, self.max_x),
            self.height,
            raw.z.clamp(self.min_z, self.max_z),
        )
    }
}

impl NavSurface for OpenGround {
    fn sample(&self, raw: Vec3, max_snap: f32) -> Option<Vec3> {
        if !(raw.x.is_finite() && raw.z.is_finite()) {
            return None;
        }
        let snapped = self.clamp(raw);
        (snapped.distance_sq_xz(raw) <= max_snap * max_snap).then_some(snapped)
    }
}
