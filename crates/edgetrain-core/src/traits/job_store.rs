use crate::errors::EdgeTrainResult;
use crate::models::{DeviceStatus, JobCommit, JobTransitionRecord, TrainingJob};

/// Training job persistence, owned by the orchestrator.
pub trait IJobStore: Send + Sync {
    /// Insert a `pending` job and set the device status in one transaction.
    /// Fails with `Conflict` if the device already has a non-terminal job.
    fn insert_job(&self, job: &TrainingJob, device_status: DeviceStatus) -> EdgeTrainResult<()>;

    fn get_job(&self, job_id: &str) -> EdgeTrainResult<Option<TrainingJob>>;

    /// Jobs in creation order, optionally restricted to one device.
    fn list_jobs(&self, device_id: Option<&str>) -> EdgeTrainResult<Vec<TrainingJob>>;

    fn active_job_for_device(&self, device_id: &str) -> EdgeTrainResult<Option<TrainingJob>>;

    /// Ids of every non-terminal job, oldest first. The poller's work queue.
    fn active_job_ids(&self) -> EdgeTrainResult<Vec<String>>;

    /// Apply a compare-and-swap commit. Returns `false` when the stored row
    /// moved on since the snapshot was read; nothing is written then.
    fn commit_transition(&self, commit: &JobCommit) -> EdgeTrainResult<bool>;

    fn transition_history(&self, job_id: &str) -> EdgeTrainResult<Vec<JobTransitionRecord>>;
}
