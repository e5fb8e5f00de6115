//! HTTP client with retry, exponential backoff, timeout, and gzip compression.
//!
//! Only GETs are retried. POSTs start remote work (training runs, builds,
//! uploads) and are sent exactly once per call. A POST that times out or
//! loses its response fails with `OutcomeUnknown`, never a transient error.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use edgetrain_core::config::RemoteConfig;
use edgetrain_core::errors::RemoteError;

use super::status::{classify_post_send_error, classify_send_error, classify_status};

/// Configuration for the HTTP transport layer.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum number of retry attempts for GETs.
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry).
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&RemoteConfig::default())
    }
}

impl From<&RemoteConfig> for HttpClientConfig {
    fn from(config: &RemoteConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.status_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// How requests authenticate.
#[derive(Clone, Default)]
pub enum Auth {
    #[default]
    None,
    /// `x-api-key` header, as the training platform expects.
    ApiKey(String),
    /// `Authorization: Bearer`, as the virtual-device source expects.
    Bearer(String),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::ApiKey(_) => f.write_str("ApiKey(***)"),
            Self::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

/// Blocking HTTP transport shared by the platform clients.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    auth: Auth,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig, auth: Auth) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| RemoteError::Unknown {
                reason: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            config,
            auth,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// GET a JSON resource, retrying transient failures with backoff.
    pub fn get_json<Resp: DeserializeOwned>(&self, url: &str) -> Result<Resp, RemoteError> {
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;
        loop {
            match self.send(self.request(Method::GET, url), classify_send_error) {
                Ok(resp) => return decode(resp),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        url,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %err,
                        "retrying GET after {:?}",
                        backoff
                    );
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(self.config.max_backoff);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// POST a JSON body once and decode the JSON response.
    pub fn post_json<Req: Serialize + ?Sized, Resp: DeserializeOwned>(
        &self,
        url: &str,
        body: &Req,
        headers: &[(&str, String)],
    ) -> Result<Resp, RemoteError> {
        let mut req = self.request(Method::POST, url).json(body);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        self.send(req, classify_post_send_error)?
            .json::<Resp>()
            .map_err(|e| classify_post_send_error(&e))
    }

    /// POST a JSON body once and return the raw response text.
    pub fn post_json_text<Req: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &Req,
        headers: &[(&str, String)],
    ) -> Result<String, RemoteError> {
        let mut req = self.request(Method::POST, url).json(body);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        self.send(req, classify_post_send_error)?
            .text()
            .map_err(|e| classify_post_send_error(&e))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let req = self.client.request(method, url);
        match &self.auth {
            Auth::None => req,
            Auth::ApiKey(key) => req.header("x-api-key", key.as_str()),
            Auth::Bearer(token) => req.bearer_auth(token),
        }
    }

    /// Send and turn every non-2xx status into a classified error.
    fn send(
        &self,
        req: RequestBuilder,
        classify: fn(&reqwest::Error) -> RemoteError,
    ) -> Result<Response, RemoteError> {
        let resp = req.send().map_err(|e| classify(&e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(classify_status(status, &body))
    }
}

fn decode<Resp: DeserializeOwned>(resp: Response) -> Result<Resp, RemoteError> {
    resp.json::<Resp>().map_err(|e| RemoteError::Unknown {
        reason: format!("deserialization failed: {e}"),
    })
}
