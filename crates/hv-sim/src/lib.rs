//! `hv-sim` — coordinator for the harvest simulation.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Motion     every agent's mover integrates one tick of travel.
//!   ② Pool       spawn timer fires (at most one node), stale
//!                reservations are swept back to Free.
//!   ③ Agents     each agent runs its state machine and recovery loops
//!                (parallel with the `parallel` feature).
//!   ④ Hubs       stale slot reservations are reclaimed.
//!   ⑤ Observe    events, tick summary, periodic snapshot.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the motion and agent phases on Rayon.             |
//! | `serde`    | Serde derives on config and hub specs.                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hv_core::{SimConfig, Vec3};
//! use hv_hub::HubSpec;
//! use hv_motion::LinearMotionFactory;
//! use hv_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), LinearMotionFactory::default())
//!     .hub(HubSpec::new("Blue", Vec3::ground(-8.0, 0.0)))
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! for score in sim.scoreboard() {
//!     println!("{}: {}", score.faction, score.store);
//! }
//! ```

pub mod builder;
pub mod error;
pub mod loader;
pub mod observer;
pub mod sim;
pub mod snapshot;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use loader::{load_hubs_csv, load_hubs_reader};
pub use observer::{NoopObserver, SimObserver};
pub use sim::Sim;
pub use snapshot::{AgentSnapshot, HubScore, TickSummary};
