//! Periodic poller: advances every non-terminal job and drains the upload
//! queue once per interval.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use edgetrain_core::constants::COMPONENT_POLLER;
use edgetrain_observability::tracing_setup::events;
use edgetrain_observability::OrchestratorMetrics;

use crate::orchestrator::{AdvanceOutcome, JobOrchestrator};
use crate::uploader::SampleUploadService;

/// Counts from one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    /// Jobs whose state changed.
    pub advanced: usize,
    /// Jobs polled with no state change.
    pub unchanged: usize,
    /// Jobs held by another caller or whose commit went stale.
    pub skipped: usize,
    pub errors: usize,
    pub uploaded: usize,
    pub upload_failures: usize,
}

pub struct Poller {
    orchestrator: Arc<JobOrchestrator>,
    uploader: Option<Arc<SampleUploadService>>,
    interval: Duration,
    metrics: Arc<OrchestratorMetrics>,
}

impl Poller {
    pub fn new(
        orchestrator: Arc<JobOrchestrator>,
        uploader: Option<Arc<SampleUploadService>>,
        interval: Duration,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            orchestrator,
            uploader,
            interval,
            metrics,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle. Blocking.
    ///
    /// Job ids come from the store, so a restarted process picks up every
    /// job still in flight.
    pub fn poll_once(&self) -> PollReport {
        let mut report = PollReport::default();

        let job_ids = match self.orchestrator.active_job_ids() {
            Ok(ids) => ids,
            Err(err) => {
                tracing::error!(component = COMPONENT_POLLER, error = %err, "cannot list active jobs");
                report.errors += 1;
                Vec::new()
            }
        };

        for job_id in &job_ids {
            match self.orchestrator.advance(job_id) {
                Ok(AdvanceOutcome::Transitioned { .. }) => report.advanced += 1,
                Ok(AdvanceOutcome::Unchanged | AdvanceOutcome::Terminal(_)) => {
                    report.unchanged += 1
                }
                Ok(AdvanceOutcome::Busy | AdvanceOutcome::Stale) => report.skipped += 1,
                Err(err) => {
                    tracing::warn!(component = COMPONENT_POLLER, job_id = %job_id, error = %err, "advance failed");
                    report.errors += 1;
                }
            }
        }

        if let Some(uploader) = &self.uploader {
            match uploader.upload_batch() {
                Ok(upload) => {
                    report.uploaded = upload.uploaded;
                    report.upload_failures = upload.failed;
                }
                Err(err) => {
                    tracing::warn!(component = COMPONENT_POLLER, error = %err, "upload pass failed");
                    report.errors += 1;
                }
            }
        }

        self.metrics.record_poll_cycle();
        events::poll_cycle_completed(
            report.advanced,
            report.unchanged,
            report.skipped,
            report.errors,
        );
        report
    }

    /// Poll every interval until `shutdown` flips to `true` or its sender
    /// is dropped. Each cycle runs on the blocking pool.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            component = COMPONENT_POLLER,
            interval_secs = self.interval.as_secs_f64(),
            "poller started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let poller = Arc::clone(&self);
                    if let Err(err) = tokio::task::spawn_blocking(move || poller.poll_once()).await {
                        tracing::error!(component = COMPONENT_POLLER, error = %err, "poll cycle panicked");
                    }
                }
            }
        }

        tracing::info!(component = COMPONENT_POLLER, "poller stopped");
    }
}
