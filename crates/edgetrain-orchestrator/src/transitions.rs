//! Pure builders for job commits.
//!
//! Each function takes the snapshot the orchestrator read and returns the
//! compare-and-swap commit that moves it one step. The snapshot inside the
//! commit carries the version the row will have once the commit applies.

use chrono::{DateTime, Utc};

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{
    DeviceEffect, DeviceStatus, JobCommit, JobState, RemoteJobRef, TrainingJob,
};

/// Detail recorded when a deploy may or may not have reached the platform.
pub const IN_DOUBT_DEPLOY_DETAIL: &str =
    "deployment outcome unknown, manual reconciliation required";

fn step(
    job: &TrainingJob,
    next: TrainingJob,
    detail: Option<String>,
    device_effect: Option<DeviceEffect>,
) -> JobCommit {
    JobCommit {
        expected_version: job.version,
        from_state: job.state,
        detail,
        device_effect,
        job: TrainingJob {
            version: job.version + 1,
            ..next
        },
    }
}

/// `pending → submitted` once the platform accepted the run.
pub fn submitted(job: &TrainingJob, remote_ref: RemoteJobRef) -> JobCommit {
    let detail = format!("submitted as remote job {remote_ref}");
    let next = TrainingJob {
        state: JobState::Submitted,
        remote_ref: Some(remote_ref),
        consecutive_failures: 0,
        ..job.clone()
    };
    step(job, next, Some(detail), None)
}

/// A poll reporting the run still in progress. `submitted` advances to
/// `training`; `training` only records the poll.
pub fn polled_in_progress(job: &TrainingJob, now: DateTime<Utc>) -> JobCommit {
    let (state, detail) = match job.state {
        JobState::Submitted => (JobState::Training, Some("remote training in progress".to_string())),
        other => (other, None),
    };
    let next = TrainingJob {
        state,
        last_polled_at: Some(now),
        consecutive_failures: 0,
        ..job.clone()
    };
    step(job, next, detail, None)
}

/// A poll reporting success. No device mutation until deployment.
pub fn training_succeeded(job: &TrainingJob, accuracy: Option<f64>, now: DateTime<Utc>) -> JobCommit {
    let detail = match accuracy {
        Some(acc) => format!("remote training succeeded (accuracy {acc:.4})"),
        None => "remote training succeeded".to_string(),
    };
    let next = TrainingJob {
        state: JobState::Completed,
        accuracy,
        last_polled_at: Some(now),
        consecutive_failures: 0,
        ..job.clone()
    };
    step(job, next, Some(detail), None)
}

/// Durably mark a deploy as in flight before the deploy call is made.
/// From `completed` this is the move to `deploying`; from `deploying` with
/// a cleared marker it re-arms the marker for a retry.
pub fn deploy_started(job: &TrainingJob, now: DateTime<Utc>) -> JobCommit {
    let detail = if job.state == JobState::Deploying {
        "retrying deployment"
    } else {
        "deployment started"
    };
    let next = TrainingJob {
        state: JobState::Deploying,
        deploy_started_at: Some(now),
        ..job.clone()
    };
    step(
        job,
        next,
        Some(detail.to_string()),
        Some(DeviceEffect::SetStatus(DeviceStatus::Deploying)),
    )
}

/// `deploying → deployed`. The same commit zeroes the device's sample count,
/// stamps `last_trained_at`, and marks it `ready`.
pub fn deployed(job: &TrainingJob, deployment_id: &str, now: DateTime<Utc>) -> JobCommit {
    let next = TrainingJob {
        state: JobState::Deployed,
        completed_at: Some(now),
        consecutive_failures: 0,
        ..job.clone()
    };
    step(
        job,
        next,
        Some(format!("deployed as {deployment_id}")),
        Some(DeviceEffect::ResetAfterDeploy { trained_at: now }),
    )
}

/// Any non-terminal state → `failed`; the device goes to `error`. The remote
/// reference is kept for later reconciliation.
pub fn failed(job: &TrainingJob, reason: impl Into<String>, now: DateTime<Utc>) -> JobCommit {
    let reason = reason.into();
    let next = TrainingJob {
        state: JobState::Failed,
        error: Some(reason.clone()),
        completed_at: Some(now),
        ..job.clone()
    };
    step(
        job,
        next,
        Some(reason),
        Some(DeviceEffect::SetStatus(DeviceStatus::Error)),
    )
}

/// A deploy found in flight after the fact: fail rather than deploy twice.
pub fn in_doubt_deploy(job: &TrainingJob, now: DateTime<Utc>) -> JobCommit {
    failed(job, IN_DOUBT_DEPLOY_DETAIL, now)
}

/// Record one transient remote failure.
///
/// The job keeps its state with the failure counter bumped and any deploy
/// marker cleared, unless this failure reaches `max_consecutive_failures`,
/// in which case the job fails.
pub fn transient_failure(
    job: &TrainingJob,
    operation: &str,
    err: &RemoteError,
    max_consecutive_failures: u32,
    now: DateTime<Utc>,
) -> JobCommit {
    let failures = job.consecutive_failures.saturating_add(1);
    if failures >= max_consecutive_failures {
        return failed(
            job,
            format!("{operation} failed {failures} consecutive times, last error: {err}"),
            now,
        );
    }
    let next = TrainingJob {
        consecutive_failures: failures,
        deploy_started_at: None,
        last_polled_at: Some(now),
        ..job.clone()
    };
    step(
        job,
        next,
        Some(format!(
            "{operation} transient failure {failures}/{max_consecutive_failures}: {err}"
        )),
        None,
    )
}
