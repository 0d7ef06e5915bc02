//! Spatial-subsystem error type.

use thiserror::Error;

/// Errors produced by `hv-spatial` constructors.  Queries never fail; they
/// return `None` instead.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("waypoint surface has no sample points")]
    NoWaypoints,

    #[error("invalid bounds: min ({min_x}, {min_z}) exceeds max ({max_x}, {max_z})")]
    InvalidBounds { min_x: f32, min_z: f32, max_x: f32, max_z: f32 },

    #[error("non-finite coordinate in surface definition")]
    NonFinite,
}

pub type SpatialResult<T> = Result<T, SpatialError>;
