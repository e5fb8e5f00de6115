use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::JobState;

/// Lock-free counters shared between the API path and the poller.
#[derive(Debug, Default)]
pub struct OrchestratorMetrics {
    samples_ingested: AtomicU64,
    triggers_fired: AtomicU64,
    triggers_skipped: AtomicU64,
    conflicts: AtomicU64,
    transitions: AtomicU64,
    jobs_deployed: AtomicU64,
    jobs_failed: AtomicU64,
    transient_remote_errors: AtomicU64,
    fatal_remote_errors: AtomicU64,
    stale_commits: AtomicU64,
    busy_skips: AtomicU64,
    poll_cycles: AtomicU64,
    samples_uploaded: AtomicU64,
    upload_failures: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub samples_ingested: u64,
    pub triggers_fired: u64,
    pub triggers_skipped: u64,
    pub conflicts: u64,
    pub transitions: u64,
    pub jobs_deployed: u64,
    pub jobs_failed: u64,
    pub transient_remote_errors: u64,
    pub fatal_remote_errors: u64,
    pub stale_commits: u64,
    pub busy_skips: u64,
    pub poll_cycles: u64,
    pub samples_uploaded: u64,
    pub upload_failures: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl OrchestratorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample_ingested(&self) {
        bump(&self.samples_ingested);
    }

    pub fn record_trigger_fired(&self) {
        bump(&self.triggers_fired);
    }

    pub fn record_trigger_skipped(&self) {
        bump(&self.triggers_skipped);
    }

    pub fn record_conflict(&self) {
        bump(&self.conflicts);
    }

    /// Count a committed state change; terminal states feed their own totals.
    pub fn record_transition(&self, to: JobState) {
        bump(&self.transitions);
        match to {
            JobState::Deployed => bump(&self.jobs_deployed),
            JobState::Failed => bump(&self.jobs_failed),
            _ => {}
        }
    }

    pub fn record_remote_error(&self, err: &RemoteError) {
        if err.is_transient() {
            bump(&self.transient_remote_errors);
        } else {
            bump(&self.fatal_remote_errors);
        }
    }

    pub fn record_stale_commit(&self) {
        bump(&self.stale_commits);
    }

    pub fn record_busy_skip(&self) {
        bump(&self.busy_skips);
    }

    pub fn record_poll_cycle(&self) {
        bump(&self.poll_cycles);
    }

    pub fn record_uploads(&self, uploaded: usize, failed: usize) {
        self.samples_uploaded
            .fetch_add(uploaded as u64, Ordering::Relaxed);
        self.upload_failures.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            samples_ingested: load(&self.samples_ingested),
            triggers_fired: load(&self.triggers_fired),
            triggers_skipped: load(&self.triggers_skipped),
            conflicts: load(&self.conflicts),
            transitions: load(&self.transitions),
            jobs_deployed: load(&self.jobs_deployed),
            jobs_failed: load(&self.jobs_failed),
            transient_remote_errors: load(&self.transient_remote_errors),
            fatal_remote_errors: load(&self.fatal_remote_errors),
            stale_commits: load(&self.stale_commits),
            busy_skips: load(&self.busy_skips),
            poll_cycles: load(&self.poll_cycles),
            samples_uploaded: load(&self.samples_uploaded),
            upload_failures: load(&self.upload_failures),
        }
    }
}
