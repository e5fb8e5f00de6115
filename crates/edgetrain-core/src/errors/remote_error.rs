/// Failures reported by the remote training platform or the virtual-device
/// source. Every remote operation either succeeds or fails with one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("not found: {reason}")]
    NotFound { reason: String },

    #[error("rate limited: {reason}")]
    RateLimited { reason: String },

    #[error("remote unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("unknown remote error: {reason}")]
    Unknown { reason: String },

    /// A mutating request may have reached the platform but no response
    /// came back. Resending it could start a second run or deployment.
    #[error("remote outcome unknown: {reason}")]
    OutcomeUnknown { reason: String },
}

impl RemoteError {
    /// Transient errors leave a job in its current state; the next poll
    /// cycle retries. Everything else fails the job immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable { .. })
    }

    /// Short machine-readable kind, used in log fields and error details.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unavailable { .. } => "unavailable",
            Self::Unknown { .. } => "unknown",
            Self::OutcomeUnknown { .. } => "outcome_unknown",
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Unauthorized { reason }
            | Self::NotFound { reason }
            | Self::RateLimited { reason }
            | Self::Unavailable { reason }
            | Self::Unknown { reason }
            | Self::OutcomeUnknown { reason } => reason,
        }
    }
}
