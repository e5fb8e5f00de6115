use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a training run on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteJobRef(String);

impl RemoteJobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteJobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a status poll reports. The orchestrator interprets nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteJobStatus {
    InProgress,
    Succeeded { accuracy: Option<f64> },
    Failed { reason: String },
}

/// Result of a deploy call that reached the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeployOutcome {
    Deployed { deployment_id: String },
    Failed { reason: String },
}
