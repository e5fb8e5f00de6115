//! Pull client for the virtual-device data source.

use std::time::Duration;

use edgetrain_core::config::VirtualDeviceConfig;
use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::NewSample;
use edgetrain_core::traits::IVirtualDeviceSource;

use crate::protocol::VirtualDeviceData;
use crate::transport::{Auth, HttpClient, HttpClientConfig};

#[derive(Debug)]
pub struct VirtualDeviceClient {
    http: HttpClient,
    base_url: String,
}

impl VirtualDeviceClient {
    /// `None` when no virtual-device URL is configured.
    pub fn from_config(
        config: &VirtualDeviceConfig,
        retry: &HttpClientConfig,
    ) -> Result<Option<Self>, RemoteError> {
        let Some(url) = config.url.as_deref().filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let auth = match &config.api_key {
            Some(key) if !key.is_empty() => Auth::Bearer(key.clone()),
            _ => Auth::None,
        };
        let http_config = HttpClientConfig {
            timeout: Duration::from_secs(config.timeout_secs),
            ..retry.clone()
        };
        Ok(Some(Self {
            http: HttpClient::new(http_config, auth)?,
            base_url: url.trim_end_matches('/').to_string(),
        }))
    }
}

impl IVirtualDeviceSource for VirtualDeviceClient {
    fn fetch_samples(&self, device_id: &str) -> Result<Vec<NewSample>, RemoteError> {
        let data: VirtualDeviceData = self
            .http
            .get_json(&format!("{}/api/devices/{device_id}/data", self.base_url))?;
        tracing::debug!(device_id, count = data.samples.len(), "virtual device samples fetched");
        Ok(data
            .samples
            .into_iter()
            .map(|s| s.into_new_sample(device_id))
            .collect())
    }
}
