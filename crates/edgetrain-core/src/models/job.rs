use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::EdgeTrainError;

use super::RemoteJobRef;

/// Lifecycle state of a training job.
///
/// `pending → submitted → training → completed → deploying → deployed`,
/// with `failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Submitted,
    Training,
    Completed,
    Deploying,
    Deployed,
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 7] = [
        Self::Pending,
        Self::Submitted,
        Self::Training,
        Self::Completed,
        Self::Deploying,
        Self::Deployed,
        Self::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Submitted => "submitted",
            Self::Training => "training",
            Self::Completed => "completed",
            Self::Deploying => "deploying",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
        }
    }

    /// `deployed` and `failed` accept no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deployed | Self::Failed)
    }

    /// Whether a commit moving a job from `self` to `next` is legal.
    ///
    /// Self-transitions of non-terminal states are allowed: they record
    /// poll timestamps and retry counters without changing state.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        if self.is_terminal() {
            return false;
        }
        if self == next || next == Failed {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Submitted)
                | (Submitted, Training)
                | (Training, Completed)
                | (Completed, Deploying)
                | (Deploying, Deployed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = EdgeTrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| EdgeTrainError::validation(format!("unknown job state: {s}")))
    }
}

/// Why a job was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerReason {
    Threshold,
    Manual,
}

impl TriggerReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerReason {
    type Err = EdgeTrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "threshold" | "auto" => Ok(Self::Threshold),
            "manual" => Ok(Self::Manual),
            other => Err(EdgeTrainError::validation(format!(
                "unknown trigger reason: {other}"
            ))),
        }
    }
}

/// One tracked remote training run, from trigger to deployment or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJob {
    pub id: String,
    pub device_id: String,
    pub reason: TriggerReason,
    pub state: JobState,
    /// Assigned by the remote platform once the run is submitted.
    pub remote_ref: Option<RemoteJobRef>,
    /// Device sample count when the job was created.
    pub samples_at_trigger: u64,
    /// Model accuracy reported by the remote platform on success.
    pub accuracy: Option<f64>,
    pub error: Option<String>,
    /// Transient remote failures since the last successful remote call.
    pub consecutive_failures: u32,
    /// Set while a deploy request may be in flight.
    pub deploy_started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Row version, bumped by every committed transition.
    pub version: u64,
}

impl TrainingJob {
    /// A fresh `pending` job with a locally generated identifier.
    pub fn new(device_id: impl Into<String>, reason: TriggerReason, samples_at_trigger: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.into(),
            reason,
            state: JobState::Pending,
            remote_ref: None,
            samples_at_trigger,
            accuracy: None,
            error: None,
            consecutive_failures: 0,
            deploy_started_at: None,
            created_at: Utc::now(),
            last_polled_at: None,
            completed_at: None,
            version: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
