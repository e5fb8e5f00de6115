//! Threshold evaluator. Pure: no storage, no clock, no side effects.

use edgetrain_core::models::{Device, DeviceStatus};

/// The fields of a device the trigger decision depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub sample_count: u64,
    pub status: DeviceStatus,
}

impl From<&Device> for DeviceSnapshot {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.device_id.clone(),
            sample_count: device.sample_count,
            status: device.status,
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    Fire,
    BelowThreshold { count: u64, threshold: u64 },
    JobActive { job_id: String },
    /// The device status rules out auto-triggering (`training`,
    /// `deploying`, or `error`).
    DeviceUnavailable { status: DeviceStatus },
}

impl TriggerDecision {
    pub fn fires(&self) -> bool {
        matches!(self, Self::Fire)
    }

    /// Stable label for logs and error details.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::BelowThreshold { .. } => "below_threshold",
            Self::JobActive { .. } => "job_active",
            Self::DeviceUnavailable { .. } => "device_unavailable",
        }
    }
}

/// Decide whether `device` should start a training run.
///
/// Fires only when the count has reached `threshold`, no job is active, and
/// the device is `idle` or `ready`.
pub fn evaluate(device: &DeviceSnapshot, threshold: u64, active_job: Option<&str>) -> TriggerDecision {
    if let Some(job_id) = active_job {
        return TriggerDecision::JobActive {
            job_id: job_id.to_string(),
        };
    }
    if !device.status.accepts_auto_trigger() {
        return TriggerDecision::DeviceUnavailable {
            status: device.status,
        };
    }
    if device.sample_count < threshold {
        return TriggerDecision::BelowThreshold {
            count: device.sample_count,
            threshold,
        };
    }
    TriggerDecision::Fire
}
