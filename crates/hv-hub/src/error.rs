//! Hub construction errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub '{faction}' must have between 1 and {max} slots, got {got}")]
    SlotCount { faction: String, got: usize, max: usize },

    #[error("hub '{faction}' has invalid slot radius {radius}")]
    Radius { faction: String, radius: f32 },
}

pub type HubResult<T> = Result<T, HubError>;
