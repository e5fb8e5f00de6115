use serde::{Deserialize, Serialize};

use super::defaults;

/// Virtual-device data source. Disabled when `url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualDeviceConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for VirtualDeviceConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: defaults::DEFAULT_VIRTUAL_DEVICE_TIMEOUT_SECS,
        }
    }
}
