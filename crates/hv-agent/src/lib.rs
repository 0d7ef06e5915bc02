//! `hv-agent` — one harvesting agent's task cycle.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`state`]    | `TaskState`                                               |
//! | [`context`]  | `AgentContext`: shared world view for one agent tick      |
//! | [`event`]    | `AgentEvent`: everything observable an agent does         |
//! | [`recovery`] | `RecoveryTimers`: idle retry, keepalive, stuck watchdog   |
//! | [`agent`]    | `Agent<M>`: the state machine itself                      |
//!
//! # Task cycle
//!
//! ```text
//!        poll ok                arrived               harvest wait done
//! Idle ──────────▶ Seeking ───────────────▶ Harvesting ─────────────────▶ Returning
//!  ▲  ◀────────── (target lost: re-poll)                                      │
//!  └──────────────────────────── at home: deposit if carrying, re-poll ◀──────┘
//! ```
//!
//! All waits are deadlines checked inside [`Agent::tick`]; nothing blocks.
//! Dropping an agent without calling [`Agent::retire`] leaves its
//! reservations to the stale sweeps of the pool and the hub.

pub mod agent;
pub mod context;
pub mod event;
pub mod recovery;
pub mod state;

#[cfg(test)]
mod tests;

pub use agent::Agent;
pub use context::AgentContext;
pub use event::AgentEvent;
pub use recovery::RecoveryTimers;
pub use state::TaskState;
