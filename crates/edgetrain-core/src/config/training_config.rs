use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Training trigger and job lifecycle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Sample count at which a device auto-triggers training. Must be > 0.
    pub threshold: u64,
    /// Evaluate the threshold on every recorded sample.
    pub auto_trigger: bool,
    /// Interval between poll cycles (seconds).
    pub poll_interval_secs: u64,
    /// Consecutive transient remote failures after which a job is failed.
    pub max_consecutive_failures: u32,
    /// Samples pushed to the remote platform per upload pass.
    pub upload_batch_size: usize,
}

impl TrainingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::DEFAULT_TRAINING_THRESHOLD,
            auto_trigger: defaults::DEFAULT_AUTO_TRIGGER,
            poll_interval_secs: defaults::DEFAULT_POLL_INTERVAL_SECS,
            max_consecutive_failures: defaults::DEFAULT_MAX_CONSECUTIVE_FAILURES,
            upload_batch_size: defaults::DEFAULT_UPLOAD_BATCH_SIZE,
        }
    }
}
