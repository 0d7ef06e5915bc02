//! `hv-core` — foundational types for the harvest coordination workspace.
//!
//! Every other `hv-*` crate depends on this one.  It has no `hv-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `ResourceId`, `HubId`, `SlotId`            |
//! | [`geo`]         | `Vec3`, ground-plane distance helpers                 |
//! | [`time`]        | `Tick`, `SimTime`, `SimClock`, `PeriodicTimer`        |
//! | [`rng`]         | `AgentRng` (per-agent), `SimRng` (global)             |
//! | [`config`]      | `SimConfig`, `PoolConfig`, `SlotConfig`, `AgentTuning`|
//! | [`error`]       | `HvError`, `HvResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{AgentTuning, FallbackPolicy, PoolConfig, SimConfig, SlotConfig};
pub use error::{HvError, HvResult};
pub use geo::Vec3;
pub use ids::{AgentId, HubId, ResourceId, SlotId};
pub use rng::{AgentRng, SimRng};
pub use time::{PeriodicTimer, SimClock, SimTime, Tick};
