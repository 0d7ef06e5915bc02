//! `hv-hub` — collection points and their docking-slot leases.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`slot_ring`] | `SlotRing`, `SlotGrant`, `SlotLease`                   |
//! | [`hub`]       | `Hub` (mutex-guarded ring + atomic store), `HubSpec`   |
//! | [`error`]     | `HubError`, `HubResult<T>`                             |
//!
//! Locking is per hub.  No operation ever holds two hubs' locks at once.

pub mod error;
pub mod hub;
pub mod slot_ring;

#[cfg(test)]
mod tests;

pub use error::{HubError, HubResult};
pub use hub::{Hub, HubSpec, DEFAULT_RADIUS, DEFAULT_SLOTS};
pub use slot_ring::{SlotGrant, SlotLease, SlotRing};
