//! Structured log events for key orchestrator operations.
//!
//! Each function emits a `tracing` event with an `event` field naming it.

use edgetrain_core::constants::{COMPONENT_POLLER, COMPONENT_UPLOADER};
use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{JobState, TriggerReason};

/// Log a training job creation.
pub fn job_created(job_id: &str, device_id: &str, reason: TriggerReason, sample_count: u64) {
    tracing::info!(
        event = "job_created",
        job_id = %job_id,
        device_id = %device_id,
        reason = %reason,
        sample_count = sample_count,
        "training job created"
    );
}

/// Log a committed state change.
pub fn job_transitioned(job_id: &str, from: JobState, to: JobState, detail: Option<&str>) {
    if to == JobState::Failed {
        tracing::warn!(
            event = "job_transitioned",
            job_id = %job_id,
            from = %from,
            to = %to,
            detail = detail.unwrap_or(""),
            "training job failed"
        );
    } else {
        tracing::info!(
            event = "job_transitioned",
            job_id = %job_id,
            from = %from,
            to = %to,
            detail = detail.unwrap_or(""),
            "training job transitioned"
        );
    }
}

/// Log a threshold evaluation that did not fire.
pub fn trigger_skipped(device_id: &str, why: &str, sample_count: u64, threshold: u64) {
    tracing::debug!(
        event = "trigger_skipped",
        device_id = %device_id,
        why = %why,
        sample_count = sample_count,
        threshold = threshold,
        "training trigger skipped"
    );
}

/// Log a failed call to the training platform.
pub fn remote_call_failed(operation: &str, job_id: Option<&str>, err: &RemoteError, attempt: u32) {
    if err.is_transient() {
        tracing::warn!(
            event = "remote_call_failed",
            operation = %operation,
            job_id = job_id.unwrap_or(""),
            kind = err.kind(),
            transient = true,
            attempt = attempt,
            error = %err,
            "remote call failed, will retry"
        );
    } else {
        tracing::error!(
            event = "remote_call_failed",
            operation = %operation,
            job_id = job_id.unwrap_or(""),
            kind = err.kind(),
            transient = false,
            attempt = attempt,
            error = %err,
            "remote call failed"
        );
    }
}

/// Log the result of one upload pass.
pub fn samples_uploaded(uploaded: usize, failed: usize) {
    tracing::info!(
        event = "samples_uploaded",
        component = COMPONENT_UPLOADER,
        uploaded = uploaded,
        failed = failed,
        "sample upload pass completed"
    );
}

/// Log the result of a virtual-device pull.
pub fn device_pull_completed(device_id: &str, fetched: usize, recorded: usize) {
    tracing::info!(
        event = "device_pull_completed",
        device_id = %device_id,
        fetched = fetched,
        recorded = recorded,
        "virtual device pull completed"
    );
}

/// Log one poller cycle.
pub fn poll_cycle_completed(advanced: usize, unchanged: usize, skipped: usize, errors: usize) {
    tracing::info!(
        event = "poll_cycle_completed",
        component = COMPONENT_POLLER,
        advanced = advanced,
        unchanged = unchanged,
        skipped = skipped,
        errors = errors,
        "poll cycle completed"
    );
}
