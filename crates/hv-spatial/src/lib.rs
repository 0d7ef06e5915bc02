//! `hv-spatial` — navigable-surface queries.
//!
//! The scheduling core never reasons about walkable geometry itself.  It
//! asks a [`NavSurface`] to validate or snap a raw point, and treats `None`
//! as "this point is not usable".
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`surface`]  | `NavSurface` trait, `OpenGround` (rectangular walkable area)|
//! | [`waypoint`] | `WaypointSurface` (R-tree snap), `WaypointSurfaceBuilder`  |
//! | [`error`]    | `SpatialError`, `SpatialResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.           |

pub mod error;
pub mod surface;
pub mod waypoint;


pub use error::{SpatialError, SpatialResult};
pub use surface::{NavSurface, OpenGround};
pub use waypoint::{WaypointSurface, WaypointSurfaceBuilder};
