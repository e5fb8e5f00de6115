use crate::models::JobState;

use super::{RemoteError, StorageError};

pub type EdgeTrainResult<T> = Result<T, EdgeTrainError>;

/// Top-level error type for every edgetrain operation.
#[derive(Debug, thiserror::Error)]
pub enum EdgeTrainError {
    /// Malformed request. Surfaced to the caller, no state change.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// The one-active-job-per-device invariant would be violated.
    #[error("device {device_id} already has active job {active_job_id}")]
    Conflict {
        device_id: String,
        active_job_id: String,
    },

    #[error("job not found: {id}")]
    JobNotFound { id: String },

    #[error("device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    /// `RateLimited` / `Unavailable`: retried on the next poll cycle.
    #[error("transient remote error: {0}")]
    RemoteTransient(RemoteError),

    /// Every other remote error: fails the job immediately.
    #[error("fatal remote error: {0}")]
    RemoteFatal(RemoteError),

    #[error("storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<RemoteError> for EdgeTrainError {
    fn from(err: RemoteError) -> Self {
        if err.is_transient() {
            Self::RemoteTransient(err)
        } else {
            Self::RemoteFatal(err)
        }
    }
}

impl EdgeTrainError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same request later and expect a
    /// different outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteTransient(_) | Self::StorageError(_))
    }
}
