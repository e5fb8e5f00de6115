//! The facade the API layer talks to.

use std::sync::Arc;

use tracing::instrument;

use edgetrain_core::config::TrainingConfig;
use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult};
use edgetrain_core::models::{
    validate_device_id, Device, DeviceStats, JobTransitionRecord, NewSample, TrainingJob,
    TriggerReason,
};
use edgetrain_core::traits::{
    IEdgeStorage, IRemoteTrainingClient, ISampleUploader, IVirtualDeviceSource,
};
use edgetrain_observability::{MetricsSnapshot, OrchestratorMetrics};

use crate::ingest::{IngestAck, Ingestor, PullReport};
use crate::orchestrator::{AdvanceOutcome, JobOrchestrator, TriggerOutcome};
use crate::poller::{PollReport, Poller};
use crate::threshold::TriggerDecision;
use crate::uploader::{SampleUploadService, UploadReport};

/// Wires storage, the remote client and the optional upload and pull
/// collaborators into an [`EdgeTrainEngine`].
pub struct EngineBuilder {
    store: Arc<dyn IEdgeStorage>,
    remote: Arc<dyn IRemoteTrainingClient>,
    config: TrainingConfig,
    uploader: Option<Arc<dyn ISampleUploader>>,
    virtual_device: Option<Arc<dyn IVirtualDeviceSource>>,
}

impl EngineBuilder {
    pub fn new(store: Arc<dyn IEdgeStorage>, remote: Arc<dyn IRemoteTrainingClient>) -> Self {
        Self {
            store,
            remote,
            config: TrainingConfig::default(),
            uploader: None,
            virtual_device: None,
        }
    }

    pub fn config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn uploader(mut self, uploader: Arc<dyn ISampleUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    pub fn virtual_device(mut self, source: Arc<dyn IVirtualDeviceSource>) -> Self {
        self.virtual_device = Some(source);
        self
    }

    pub fn build(self) -> EdgeTrainEngine {
        let metrics = Arc::new(OrchestratorMetrics::new());
        let orchestrator = Arc::new(JobOrchestrator::new(
            Arc::clone(&self.store),
            self.remote,
            self.config.clone(),
            Arc::clone(&metrics),
        ));
        let uploads = self.uploader.map(|uploader| {
            Arc::new(SampleUploadService::new(
                Arc::clone(&self.store),
                uploader,
                self.config.upload_batch_size,
                Arc::clone(&metrics),
            ))
        });
        let ingestor = Ingestor::new(
            Arc::clone(&self.store),
            Arc::clone(&orchestrator),
            self.virtual_device,
            Arc::clone(&metrics),
        );
        let poller = Arc::new(Poller::new(
            Arc::clone(&orchestrator),
            uploads.clone(),
            self.config.poll_interval(),
            Arc::clone(&metrics),
        ));
        EdgeTrainEngine {
            store: self.store,
            orchestrator,
            ingestor,
            uploads,
            poller,
            metrics,
        }
    }
}

pub struct EdgeTrainEngine {
    store: Arc<dyn IEdgeStorage>,
    orchestrator: Arc<JobOrchestrator>,
    ingestor: Ingestor,
    uploads: Option<Arc<SampleUploadService>>,
    poller: Arc<Poller>,
    metrics: Arc<OrchestratorMetrics>,
}

impl EdgeTrainEngine {
    pub fn builder(
        store: Arc<dyn IEdgeStorage>,
        remote: Arc<dyn IRemoteTrainingClient>,
    ) -> EngineBuilder {
        EngineBuilder::new(store, remote)
    }

    /// Start a training run and return the new job id.
    ///
    /// `Manual` skips the threshold; `Threshold` requires the evaluator to
    /// fire. Either way a device with an active job yields `Conflict`.
    #[instrument(skip(self))]
    pub fn trigger_training(&self, device_id: &str, reason: TriggerReason) -> EdgeTrainResult<String> {
        validate_device_id(device_id)?;
        match reason {
            TriggerReason::Manual => Ok(self.orchestrator.trigger_manual(device_id)?.id),
            TriggerReason::Threshold => match self.orchestrator.evaluate_and_trigger(device_id)? {
                TriggerOutcome::Created(job) => Ok(job.id),
                TriggerOutcome::Skipped(TriggerDecision::JobActive { job_id }) => {
                    Err(EdgeTrainError::Conflict {
                        device_id: device_id.to_string(),
                        active_job_id: job_id,
                    })
                }
                TriggerOutcome::Skipped(TriggerDecision::BelowThreshold { count, threshold }) => {
                    Err(EdgeTrainError::validation(format!(
                        "device {device_id} has {count} samples, threshold is {threshold}"
                    )))
                }
                TriggerOutcome::Skipped(TriggerDecision::DeviceUnavailable { status }) => {
                    Err(EdgeTrainError::validation(format!(
                        "device {device_id} is {status} and cannot auto-trigger"
                    )))
                }
                TriggerOutcome::Skipped(TriggerDecision::Fire) => Err(EdgeTrainError::validation(
                    format!("trigger for device {device_id} was not applied"),
                )),
            },
        }
    }

    pub fn get_job(&self, job_id: &str) -> EdgeTrainResult<TrainingJob> {
        self.store
            .get_job(job_id)?
            .ok_or_else(|| EdgeTrainError::JobNotFound {
                id: job_id.to_string(),
            })
    }

    /// Jobs in creation order.
    pub fn list_jobs(&self, device_id: Option<&str>) -> EdgeTrainResult<Vec<TrainingJob>> {
        self.store.list_jobs(device_id)
    }

    pub fn job_history(&self, job_id: &str) -> EdgeTrainResult<Vec<JobTransitionRecord>> {
        self.get_job(job_id)?;
        self.store.transition_history(job_id)
    }

    pub fn get_device_stats(&self, device_id: &str) -> EdgeTrainResult<DeviceStats> {
        self.store
            .get_device(device_id)?
            .map(|device| DeviceStats::from(&device))
            .ok_or_else(|| EdgeTrainError::DeviceNotFound {
                id: device_id.to_string(),
            })
    }

    pub fn register_device(&self, device_id: &str) -> EdgeTrainResult<Device> {
        self.store.register_device(device_id)
    }

    pub fn list_devices(&self) -> EdgeTrainResult<Vec<Device>> {
        self.store.list_devices()
    }

    pub fn record_sample(&self, sample: &NewSample) -> EdgeTrainResult<IngestAck> {
        self.ingestor.record_sample(sample)
    }

    pub fn pull_from_virtual_device(&self, device_id: &str) -> EdgeTrainResult<PullReport> {
        self.ingestor.pull_from_virtual_device(device_id)
    }

    /// Push up to `limit` pending samples. Fails with `ConfigError` when no
    /// uploader is configured.
    pub fn upload_pending(&self, limit: usize) -> EdgeTrainResult<UploadReport> {
        match &self.uploads {
            Some(uploads) => uploads.upload_pending(limit),
            None => Err(EdgeTrainError::ConfigError(
                "no sample uploader configured".into(),
            )),
        }
    }

    pub fn advance_job(&self, job_id: &str) -> EdgeTrainResult<AdvanceOutcome> {
        self.orchestrator.advance(job_id)
    }

    pub fn poll_once(&self) -> PollReport {
        self.poller.poll_once()
    }

    /// The poller, for spawning with [`Poller::run`].
    pub fn poller(&self) -> Arc<Poller> {
        Arc::clone(&self.poller)
    }

    pub fn orchestrator(&self) -> Arc<JobOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
