//! Ingestion hook: stores samples and runs the threshold evaluator on each.

use std::sync::Arc;

use serde::Serialize;

use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult};
use edgetrain_core::models::{validate_device_id, NewSample};
use edgetrain_core::traits::{IEdgeStorage, IVirtualDeviceSource};
use edgetrain_observability::tracing_setup::events;
use edgetrain_observability::OrchestratorMetrics;

use crate::orchestrator::{JobOrchestrator, TriggerOutcome};

/// Acknowledgement returned for every stored sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestAck {
    pub sample_id: i64,
    pub device_id: String,
    pub device_sample_count: u64,
    /// Set when this sample pushed the device over the threshold.
    pub triggered_job: Option<String>,
}

/// Summary of one virtual-device pull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    pub fetched: usize,
    pub recorded: usize,
    pub rejected: usize,
}

pub struct Ingestor {
    store: Arc<dyn IEdgeStorage>,
    orchestrator: Arc<JobOrchestrator>,
    source: Option<Arc<dyn IVirtualDeviceSource>>,
    auto_trigger: bool,
    metrics: Arc<OrchestratorMetrics>,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn IEdgeStorage>,
        orchestrator: Arc<JobOrchestrator>,
        source: Option<Arc<dyn IVirtualDeviceSource>>,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        let auto_trigger = orchestrator.config().auto_trigger;
        Self {
            store,
            orchestrator,
            source,
            auto_trigger,
            metrics,
        }
    }

    /// Store a sample, bump the device count, and evaluate the threshold.
    ///
    /// The sample is durable once this returns `Ok`. A failure while
    /// triggering is logged and does not fail the ingest; the next sample
    /// re-evaluates.
    pub fn record_sample(&self, sample: &NewSample) -> EdgeTrainResult<IngestAck> {
        let recorded = self.store.record_sample(sample)?;
        self.metrics.record_sample_ingested();

        let triggered_job = if self.auto_trigger {
            match self.on_sample_recorded(&sample.device_id) {
                Ok(TriggerOutcome::Created(job)) => Some(job.id),
                Ok(TriggerOutcome::Skipped(_)) => None,
                Err(err) => {
                    tracing::warn!(
                        device_id = %sample.device_id,
                        error = %err,
                        "threshold evaluation failed after ingest"
                    );
                    None
                }
            }
        } else {
            None
        };

        Ok(IngestAck {
            sample_id: recorded.sample.id,
            device_id: recorded.sample.device_id,
            device_sample_count: recorded.device_sample_count,
            triggered_job,
        })
    }

    /// Evaluate the threshold for a device that just received a sample.
    pub fn on_sample_recorded(&self, device_id: &str) -> EdgeTrainResult<TriggerOutcome> {
        self.orchestrator.evaluate_and_trigger(device_id)
    }

    /// Fetch the latest readings from the virtual device and ingest each one.
    ///
    /// Readings that fail validation are counted and skipped.
    pub fn pull_from_virtual_device(&self, device_id: &str) -> EdgeTrainResult<PullReport> {
        let Some(source) = self.source.as_ref() else {
            return Err(EdgeTrainError::ConfigError(
                "no virtual device source configured".into(),
            ));
        };
        validate_device_id(device_id)?;

        let samples = source.fetch_samples(device_id)?;
        let mut report = PullReport {
            fetched: samples.len(),
            ..PullReport::default()
        };
        for sample in &samples {
            match self.record_sample(sample) {
                Ok(_) => report.recorded += 1,
                Err(EdgeTrainError::Validation { reason }) => {
                    tracing::warn!(device_id, %reason, "rejected virtual device sample");
                    report.rejected += 1;
                }
                Err(err) => return Err(err),
            }
        }
        events::device_pull_completed(device_id, report.fetched, report.recorded);
        Ok(report)
    }
}
