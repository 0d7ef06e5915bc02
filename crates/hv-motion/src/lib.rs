//! `hv-motion` — the movement layer as seen by the scheduling core.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`motion`] | `Motion` trait, `MotionFactory` trait                     |
//! | [`linear`] | `LinearMotion`, `LinearMotionFactory`                     |
//!
//! # Contract
//!
//! The core only ever *writes* destinations and *reads* progress
//! (`remaining_distance`, `path_pending`, `position`).  Steering, collision
//! avoidance and path planning belong to the implementation.  Each agent
//! owns its `Motion` exclusively; the coordinator advances all of them once
//! per tick before the agents run.

pub mod linear;
pub mod motion;


pub use linear::{LinearMotion, LinearMotionFactory, DEFAULT_STOPPING_DISTANCE};
pub use motion::{Motion, MotionFactory};
