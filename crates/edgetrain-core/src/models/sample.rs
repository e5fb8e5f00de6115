use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_SENSOR_TYPE_LEN;
use crate::errors::{EdgeTrainError, EdgeTrainResult};

use super::validate_device_id;

/// A sample as submitted by the ingestion layer, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSample {
    pub device_id: String,
    pub sensor_type: String,
    /// Sampling frequency in Hz.
    pub sample_rate: f64,
    /// Sensor readings. Opaque to the orchestrator.
    pub payload: serde_json::Value,
    pub label: Option<String>,
}

impl NewSample {
    pub fn validate(&self) -> EdgeTrainResult<()> {
        validate_device_id(&self.device_id)?;
        if self.sensor_type.trim().is_empty() {
            return Err(EdgeTrainError::validation("sensor type must not be empty"));
        }
        if self.sensor_type.len() > MAX_SENSOR_TYPE_LEN {
            return Err(EdgeTrainError::validation(format!(
                "sensor type longer than {MAX_SENSOR_TYPE_LEN} characters"
            )));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EdgeTrainError::validation(format!(
                "sample rate must be a positive number, got {}",
                self.sample_rate
            )));
        }
        if self.payload.is_null() {
            return Err(EdgeTrainError::validation("sample payload must not be null"));
        }
        Ok(())
    }
}

/// A stored sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: i64,
    pub device_id: String,
    pub sensor_type: String,
    pub sample_rate: f64,
    pub payload: serde_json::Value,
    pub label: Option<String>,
    pub uploaded: bool,
    /// Identifier assigned by the remote platform on upload.
    pub remote_sample_id: Option<String>,
    /// Rejected upload attempts. Retried samples queue behind fresh ones.
    pub upload_attempts: u32,
    pub last_upload_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of storing a sample: the row plus the device count it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSample {
    pub sample: Sample,
    pub device_sample_count: u64,
}
