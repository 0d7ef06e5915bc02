use thiserror::Error;

use hv_core::{HubId, HvError};
use hv_hub::HubError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("simulation needs at least one hub")]
    NoHubs,

    #[error("hub {0} does not exist")]
    UnknownHub(HubId),

    #[error(transparent)]
    Core(#[from] HvError),

    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
