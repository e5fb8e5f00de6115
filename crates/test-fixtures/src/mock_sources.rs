use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{NewSample, Sample};
use edgetrain_core::traits::{ISampleUploader, IVirtualDeviceSource};

/// Records uploads; sample ids listed in `failing` are rejected as unavailable.
#[derive(Default)]
pub struct MockUploader {
    uploaded: Mutex<Vec<i64>>,
    failing: Mutex<HashSet<i64>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sample(&self, sample_id: i64) {
        self.failing.lock().unwrap().insert(sample_id);
    }

    pub fn heal_sample(&self, sample_id: i64) {
        self.failing.lock().unwrap().remove(&sample_id);
    }

    pub fn uploaded(&self) -> Vec<i64> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl ISampleUploader for MockUploader {
    fn upload_sample(&self, sample: &Sample) -> Result<String, RemoteError> {
        if self.failing.lock().unwrap().contains(&sample.id) {
            return Err(RemoteError::Unavailable {
                reason: format!("ingestion refused sample {}", sample.id),
            });
        }
        self.uploaded.lock().unwrap().push(sample.id);
        Ok(format!("ei-{}", sample.id))
    }
}

/// Virtual device source backed by canned per-device batches.
#[derive(Default)]
pub struct MockVirtualDevice {
    batches: Mutex<HashMap<String, Result<Vec<NewSample>, RemoteError>>>,
}

impl MockVirtualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(self, device_id: &str, samples: Vec<NewSample>) -> Self {
        self.batches
            .lock()
            .unwrap()
            .insert(device_id.to_string(), Ok(samples));
        self
    }

    pub fn with_error(self, device_id: &str, err: RemoteError) -> Self {
        self.batches
            .lock()
            .unwrap()
            .insert(device_id.to_string(), Err(err));
        self
    }
}

impl IVirtualDeviceSource for MockVirtualDevice {
    fn fetch_samples(&self, device_id: &str) -> Result<Vec<NewSample>, RemoteError> {
        self.batches
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(RemoteError::NotFound {
                    reason: format!("unknown virtual device {device_id}"),
                })
            })
    }
}
