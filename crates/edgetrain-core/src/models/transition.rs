use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeviceStatus, JobState, TrainingJob};

/// Append-only history row written for every state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobTransitionRecord {
    pub job_id: String,
    /// `None` for the row written when the job is created.
    pub from_state: Option<JobState>,
    pub to_state: JobState,
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Device-side effect committed in the same transaction as a job transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEffect {
    SetStatus(DeviceStatus),
    /// Reset the sample count, stamp `last_trained_at`, mark `ready`.
    ResetAfterDeploy { trained_at: DateTime<Utc> },
}

/// A compare-and-swap commit of a job snapshot.
///
/// Applies only while the stored row still has `expected_version` and
/// `from_state`; otherwise the commit is stale and nothing is written.
#[derive(Debug, Clone)]
pub struct JobCommit {
    pub job: TrainingJob,
    pub expected_version: u64,
    pub from_state: JobState,
    pub detail: Option<String>,
    pub device_effect: Option<DeviceEffect>,
}
