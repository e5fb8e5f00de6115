use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Remote ML platform endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the platform's project API.
    pub api_base_url: String,
    /// Base URL of the sample ingestion service.
    pub ingestion_url: String,
    /// Remote project identifier.
    pub project_id: String,
    /// API key sent as `x-api-key`. Prefer the `EDGETRAIN_API_KEY` env var.
    pub api_key: String,
    /// Deployment target passed to the deploy call.
    pub deploy_target: String,
    /// Per-request timeout (seconds).
    pub timeout_secs: u64,
    /// Retries for idempotent GET requests. POSTs are never retried.
    pub status_retries: u32,
    /// Initial backoff between GET retries (milliseconds, doubles per retry).
    pub initial_backoff_ms: u64,
    /// Backoff ceiling (milliseconds).
    pub max_backoff_ms: u64,
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::DEFAULT_API_BASE_URL.to_string(),
            ingestion_url: defaults::DEFAULT_INGESTION_URL.to_string(),
            project_id: String::new(),
            api_key: String::new(),
            deploy_target: defaults::DEFAULT_DEPLOY_TARGET.to_string(),
            timeout_secs: defaults::DEFAULT_REMOTE_TIMEOUT_SECS,
            status_retries: defaults::DEFAULT_STATUS_RETRIES,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
        }
    }
}
