use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_DEVICE_ID_LEN;
use crate::errors::{EdgeTrainError, EdgeTrainResult};

/// Aggregate status of a device as seen by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Idle,
    Training,
    Deploying,
    Ready,
    Error,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 5] = [
        Self::Idle,
        Self::Training,
        Self::Deploying,
        Self::Ready,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Training => "training",
            Self::Deploying => "deploying",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    /// Only idle or ready devices may auto-trigger. A device in `error`
    /// keeps accumulating samples until an operator resolves it.
    pub fn accepts_auto_trigger(self) -> bool {
        matches!(self, Self::Idle | Self::Ready)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = EdgeTrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| EdgeTrainError::validation(format!("unknown device status: {s}")))
    }
}

/// A registered sample source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    /// Samples recorded since the last deployed training run.
    pub sample_count: u64,
    pub last_trained_at: Option<DateTime<Utc>>,
    pub status: DeviceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The view of a device exposed to the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub device_id: String,
    pub sample_count: u64,
    pub status: DeviceStatus,
    pub last_trained_at: Option<DateTime<Utc>>,
}

impl From<&Device> for DeviceStats {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.device_id.clone(),
            sample_count: device.sample_count,
            status: device.status,
            last_trained_at: device.last_trained_at,
        }
    }
}

/// Device identifiers are MAC addresses or short slugs: ASCII alphanumerics
/// plus `:`, `-`, `_` and `.`.
pub fn validate_device_id(device_id: &str) -> EdgeTrainResult<()> {
    if device_id.is_empty() {
        return Err(EdgeTrainError::validation("device id must not be empty"));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(EdgeTrainError::validation(format!(
            "device id longer than {MAX_DEVICE_ID_LEN} characters"
        )));
    }
    if let Some(bad) = device_id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.')))
    {
        return Err(EdgeTrainError::validation(format!(
            "device id contains invalid character {bad:?}"
        )));
    }
    Ok(())
}
