//! `hv-pool` — resource nodes and the pool that spawns and matches them.
//!
//! # Crate layout
//!
//! | Module   | Contents                                                      |
//! |----------|---------------------------------------------------------------|
//! | [`node`] | `ResourceNode` (tri-state CAS word), `NodeState`, `ResourceLease` |
//! | [`pool`] | `ResourcePool` (spawn timer, nearest-free matching, sweeps)   |
//!
//! # Concurrency
//!
//! Node ownership never takes a lock.  `ResourcePool::nearest_free` takes
//! `&self` and is safe to call from many threads in the same tick: two
//! callers can never both reserve the same node, and a caller that loses a
//! race simply falls through to the next-nearest candidate.

pub mod node;
pub mod pool;


pub use node::{NodeState, ResourceLease, ResourceNode};
pub use pool::{PoolTick, ResourcePool};
