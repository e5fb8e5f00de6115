//! Wire types for the training platform and the virtual-device source.

use serde::{Deserialize, Serialize};

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{NewSample, RemoteJobStatus, Sample};

/// Envelope fields every platform response carries.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiStatus {
    /// A `200` with `success: false` is a rejection the client cannot classify.
    pub fn into_result(self, operation: &str) -> Result<(), RemoteError> {
        if self.success {
            return Ok(());
        }
        Err(RemoteError::Unknown {
            reason: format!(
                "{operation} rejected: {}",
                self.error.unwrap_or_else(|| "no error detail".into())
            ),
        })
    }
}

/// Response to `POST /api/{project}/jobs/retrain` and the build endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStartedResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    /// Numeric on the platform, kept as raw JSON to accept strings too.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

impl JobStartedResponse {
    pub fn job_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Response to `GET /api/{project}/jobs/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub job: Option<JobStatusBody>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusBody {
    /// Completion timestamp; absent while the job runs.
    #[serde(default)]
    pub finished: Option<String>,
    #[serde(default)]
    pub finished_successful: Option<bool>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatusBody {
    pub fn to_status(&self) -> RemoteJobStatus {
        let finished = self.finished.as_deref().is_some_and(|f| !f.is_empty());
        if !finished {
            return RemoteJobStatus::InProgress;
        }
        match self.finished_successful {
            Some(true) => RemoteJobStatus::Succeeded {
                accuracy: self.accuracy,
            },
            _ => RemoteJobStatus::Failed {
                reason: self
                    .error
                    .clone()
                    .unwrap_or_else(|| "remote training job failed".into()),
            },
        }
    }
}

/// Data-acquisition document posted to the ingestion service.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionDocument {
    pub protected: Protected,
    pub signature: String,
    pub payload: IngestionPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct Protected {
    pub ver: &'static str,
    pub alg: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionPayload {
    pub device_name: String,
    pub device_type: String,
    pub interval_ms: f64,
    pub sensors: serde_json::Value,
    pub values: serde_json::Value,
}

/// Unsigned signature placeholder accepted with `alg: none`.
const UNSIGNED: &str = "0000000000000000000000000000000000000000000000000000000000000000";

impl IngestionDocument {
    /// Shape a stored sample for ingestion. A payload object carrying
    /// `values` (and optionally `sensors`) is unpacked; any other payload is
    /// sent as the value series of a single sensor named after the sensor type.
    pub fn from_sample(sample: &Sample) -> Self {
        let values = sample
            .payload
            .get("values")
            .cloned()
            .unwrap_or_else(|| sample.payload.clone());
        let sensors = sample.payload.get("sensors").cloned().unwrap_or_else(|| {
            serde_json::json!([{ "name": sample.sensor_type, "units": "N/A" }])
        });
        Self {
            protected: Protected {
                ver: "v1",
                alg: "none",
            },
            signature: UNSIGNED.to_string(),
            payload: IngestionPayload {
                device_name: sample.device_id.clone(),
                device_type: sample.sensor_type.clone(),
                interval_ms: 1000.0 / sample.sample_rate,
                sensors,
                values,
            },
        }
    }
}

/// Response of `GET {url}/api/devices/{id}/data`.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualDeviceData {
    #[serde(default)]
    pub samples: Vec<VirtualDeviceSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualDeviceSample {
    pub sensor_type: String,
    pub sample_rate: f64,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub label: Option<String>,
}

impl VirtualDeviceSample {
    pub fn into_new_sample(self, device_id: &str) -> NewSample {
        NewSample {
            device_id: device_id.to_string(),
            sensor_type: self.sensor_type,
            sample_rate: self.sample_rate,
            payload: self.data,
            label: self.label,
        }
    }
}
