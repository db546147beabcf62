use chronicle_core::ChronicleError;
use storage::StorageError;
use thiserror::Error;

use crate::day_key::DayKey;

/// Failure of one export or post attempt. The driver logs it and retries on a later tick.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{action} timed out after {secs}s")]
    Timeout { action: &'static str, secs: u64 },

    #[error("{0} has not been exported yet")]
    NotExported(DayKey),
}

impl From<ChronicleError> for PipelineError {
    fn from(e: ChronicleError) -> Self {
        match e {
            ChronicleError::Io(e) => PipelineError::Io(e),
            other => PipelineError::Transport(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
