//! Configuration for every edgetrain subsystem.
//!
//! # Examples
//!
//! ```
//! use edgetrain_core::config::EdgeTrainConfig;
//!
//! let config = EdgeTrainConfig::from_toml("[training]\nthreshold = 250").unwrap();
//! assert_eq!(config.training.threshold, 250);
//! assert_eq!(config.training.poll_interval_secs, 30);
//! ```

pub mod defaults;
mod observability_config;
mod remote_config;
mod storage_config;
mod training_config;
mod virtual_device_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{EdgeTrainError, EdgeTrainResult};

pub use observability_config::ObservabilityConfig;
pub use remote_config::RemoteConfig;
pub use storage_config::StorageConfig;
pub use training_config::TrainingConfig;
pub use virtual_device_config::VirtualDeviceConfig;

/// Root configuration. Every section is optional in TOML and falls back to
/// the values in [`defaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeTrainConfig {
    pub storage: StorageConfig,
    pub training: TrainingConfig,
    pub remote: RemoteConfig,
    pub virtual_device: VirtualDeviceConfig,
    pub observability: ObservabilityConfig,
}

impl EdgeTrainConfig {
    /// Parse a TOML document. Missing sections and fields take defaults.
    pub fn from_toml(source: &str) -> EdgeTrainResult<Self> {
        toml::from_str(source).map_err(|e| EdgeTrainError::ConfigError(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> EdgeTrainResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            EdgeTrainError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&source)
    }

    /// Overlay secrets and paths from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(defaults::ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.remote.api_key = key;
        }
        if let Some(key) = lookup(defaults::ENV_VIRTUAL_DEVICE_API_KEY).filter(|v| !v.is_empty()) {
            self.virtual_device.api_key = Some(key);
        }
        if let Some(path) = lookup(defaults::ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.storage.db_path = path;
        }
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> EdgeTrainResult<()> {
        if self.training.threshold == 0 {
            return Err(EdgeTrainError::ConfigError(
                "training.threshold must be a positive integer".into(),
            ));
        }
        if self.training.poll_interval_secs == 0 {
            return Err(EdgeTrainError::ConfigError(
                "training.poll_interval_secs must be > 0".into(),
            ));
        }
        if self.training.max_consecutive_failures == 0 {
            return Err(EdgeTrainError::ConfigError(
                "training.max_consecutive_failures must be > 0".into(),
            ));
        }
        if self.training.upload_batch_size == 0 {
            return Err(EdgeTrainError::ConfigError(
                "training.upload_batch_size must be > 0".into(),
            ));
        }
        if self.remote.timeout_secs == 0 {
            return Err(EdgeTrainError::ConfigError(
                "remote.timeout_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}
