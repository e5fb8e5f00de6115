//! Pushes stored samples to the platform's ingestion service.

use std::sync::Arc;

use serde::Serialize;

use edgetrain_core::constants::MAX_UPLOAD_BATCH_SIZE;
use edgetrain_core::errors::{EdgeTrainResult, RemoteError};
use edgetrain_core::traits::{IEdgeStorage, ISampleUploader};
use edgetrain_observability::tracing_setup::events;
use edgetrain_observability::OrchestratorMetrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
}

/// At-least-once upload: the uploaded flag is flipped only after the
/// platform acknowledged the sample, so a crash in between re-sends it.
pub struct SampleUploadService {
    store: Arc<dyn IEdgeStorage>,
    uploader: Arc<dyn ISampleUploader>,
    batch_size: usize,
    metrics: Arc<OrchestratorMetrics>,
}

impl SampleUploadService {
    pub fn new(
        store: Arc<dyn IEdgeStorage>,
        uploader: Arc<dyn ISampleUploader>,
        batch_size: usize,
        metrics: Arc<OrchestratorMetrics>,
    ) -> Self {
        Self {
            store,
            uploader,
            batch_size: batch_size.clamp(1, MAX_UPLOAD_BATCH_SIZE),
            metrics,
        }
    }

    /// Upload one batch of the configured size.
    pub fn upload_batch(&self) -> EdgeTrainResult<UploadReport> {
        self.upload_pending(self.batch_size)
    }

    /// Upload up to `limit` pending samples, fewest failed attempts first.
    ///
    /// A sample the platform rejects stays pending with its attempt count
    /// bumped, so it queues behind samples that have not failed yet. An
    /// `Unauthorized` response ends the pass early without charging the
    /// sample, since every remaining upload would fail the same way.
    pub fn upload_pending(&self, limit: usize) -> EdgeTrainResult<UploadReport> {
        let limit = limit.min(MAX_UPLOAD_BATCH_SIZE);
        let mut report = UploadReport::default();
        if limit == 0 {
            return Ok(report);
        }
        for sample in self.store.pending_uploads(limit)? {
            match self.uploader.upload_sample(&sample) {
                Ok(remote_id) => {
                    self.store.mark_uploaded(sample.id, Some(&remote_id))?;
                    report.uploaded += 1;
                }
                Err(err) => {
                    report.failed += 1;
                    self.metrics.record_remote_error(&err);
                    events::remote_call_failed("upload_sample", None, &err, 1);
                    if matches!(err, RemoteError::Unauthorized { .. }) {
                        break;
                    }
                    self.store.record_upload_failure(sample.id, &err.to_string())?;
                }
            }
        }
        self.metrics.record_uploads(report.uploaded, report.failed);
        events::samples_uploaded(report.uploaded, report.failed);
        Ok(report)
    }
}
