use crate::errors::EdgeTrainResult;
use crate::models::{NewSample, RecordedSample, Sample};

/// Durable record of ingested samples.
pub trait ISampleStore: Send + Sync {
    /// Store a sample and atomically increment its device's sample count,
    /// registering the device on first sight.
    fn record_sample(&self, sample: &NewSample) -> EdgeTrainResult<RecordedSample>;

    fn get_sample(&self, id: i64) -> EdgeTrainResult<Option<Sample>>;

    /// Not-yet-uploaded samples across all devices, fewest failed attempts
    /// first, then oldest first.
    fn pending_uploads(&self, limit: usize) -> EdgeTrainResult<Vec<Sample>>;

    /// Flip the uploaded flag. Besides upload bookkeeping, a stored sample
    /// is never mutated.
    fn mark_uploaded(&self, sample_id: i64, remote_sample_id: Option<&str>) -> EdgeTrainResult<()>;

    /// Count a rejected upload and keep the platform's reason.
    fn record_upload_failure(&self, sample_id: i64, error: &str) -> EdgeTrainResult<()>;

    /// Total stored samples for a device, regardless of training resets.
    fn count_samples(&self, device_id: &str) -> EdgeTrainResult<u64>;
}
