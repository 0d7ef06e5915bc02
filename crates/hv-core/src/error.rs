//! Workspace error type.
//!
//! Sub-crates define their own error enums and either convert into `HvError`
//! or wrap it as one variant via `#[from]`.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `hv-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum HvError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for all `hv-*` crates.
pub type HvResult<T> = Result<T, HvError>;
