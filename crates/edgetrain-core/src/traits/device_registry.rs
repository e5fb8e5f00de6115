use crate::errors::EdgeTrainResult;
use crate::models::{Device, DeviceStatus};

/// Per-device aggregate state.
pub trait IDeviceRegistry: Send + Sync {
    /// Register a device in `idle`. Idempotent: returns the existing row.
    fn register_device(&self, device_id: &str) -> EdgeTrainResult<Device>;

    fn get_device(&self, device_id: &str) -> EdgeTrainResult<Option<Device>>;

    fn list_devices(&self) -> EdgeTrainResult<Vec<Device>>;

    fn set_device_status(&self, device_id: &str, status: DeviceStatus) -> EdgeTrainResult<()>;
}
