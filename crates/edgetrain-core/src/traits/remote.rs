use crate::errors::RemoteError;
use crate::models::{DeployOutcome, NewSample, RemoteJobRef, RemoteJobStatus, Sample};

/// The three calls the orchestrator makes against the training platform.
/// All of them block for the duration of one request.
pub trait IRemoteTrainingClient: Send + Sync {
    fn start_training(&self, device_id: &str) -> Result<RemoteJobRef, RemoteError>;

    fn get_status(&self, job: &RemoteJobRef) -> Result<RemoteJobStatus, RemoteError>;

    fn deploy(&self, job: &RemoteJobRef) -> Result<DeployOutcome, RemoteError>;
}

/// Pushes one stored sample to the platform's ingestion service.
pub trait ISampleUploader: Send + Sync {
    /// Returns the identifier the platform assigned to the sample.
    fn upload_sample(&self, sample: &Sample) -> Result<String, RemoteError>;
}

/// Pulls sensor readings from a virtual device.
pub trait IVirtualDeviceSource: Send + Sync {
    fn fetch_samples(&self, device_id: &str) -> Result<Vec<NewSample>, RemoteError>;
}
