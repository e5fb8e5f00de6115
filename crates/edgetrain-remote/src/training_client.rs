//! `IRemoteTrainingClient` + `ISampleUploader` over the platform's REST API.

use tracing::instrument;

use edgetrain_core::config::RemoteConfig;
use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{DeployOutcome, RemoteJobRef, RemoteJobStatus, Sample};
use edgetrain_core::traits::{IRemoteTrainingClient, ISampleUploader};

use crate::protocol::{IngestionDocument, JobStartedResponse, JobStatusResponse};
use crate::transport::{Auth, HttpClient, HttpClientConfig};

/// Client for one remote project.
#[derive(Debug)]
pub struct HttpTrainingClient {
    http: HttpClient,
    api_base_url: String,
    ingestion_url: String,
    project_id: String,
    deploy_target: String,
}

impl HttpTrainingClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let auth = if config.api_key.is_empty() {
            Auth::None
        } else {
            Auth::ApiKey(config.api_key.clone())
        };
        Ok(Self {
            http: HttpClient::new(HttpClientConfig::from(config), auth)?,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            ingestion_url: config.ingestion_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            deploy_target: config.deploy_target.clone(),
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/api/{}/{path}", self.api_base_url, self.project_id)
    }
}

impl IRemoteTrainingClient for HttpTrainingClient {
    #[instrument(skip(self))]
    fn start_training(&self, device_id: &str) -> Result<RemoteJobRef, RemoteError> {
        let resp: JobStartedResponse = self.http.post_json(
            &self.project_url("jobs/retrain"),
            &serde_json::json!({}),
            &[],
        )?;
        let job_id = resp.job_id();
        resp.status.into_result("start training")?;
        job_id.map(RemoteJobRef::new).ok_or_else(|| RemoteError::Unknown {
            reason: "start training response carried no job id".into(),
        })
    }

    #[instrument(skip(self, job), fields(remote_ref = %job))]
    fn get_status(&self, job: &RemoteJobRef) -> Result<RemoteJobStatus, RemoteError> {
        let resp: JobStatusResponse = self
            .http
            .get_json(&self.project_url(&format!("jobs/{job}/status")))?;
        resp.status.into_result("job status")?;
        resp.job.map(|body| body.to_status()).ok_or_else(|| RemoteError::Unknown {
            reason: format!("status response for job {job} carried no job"),
        })
    }

    #[instrument(skip(self, job), fields(remote_ref = %job))]
    fn deploy(&self, job: &RemoteJobRef) -> Result<DeployOutcome, RemoteError> {
        let resp: JobStartedResponse = self.http.post_json(
            &self.project_url(&format!("jobs/build-ondevice-model?type={}", self.deploy_target)),
            &serde_json::json!({ "engine": "tflite" }),
            &[],
        )?;
        if !resp.status.success {
            return Ok(DeployOutcome::Failed {
                reason: resp
                    .status
                    .error
                    .unwrap_or_else(|| "deployment rejected".into()),
            });
        }
        Ok(DeployOutcome::Deployed {
            deployment_id: resp.job_id().unwrap_or_else(|| job.to_string()),
        })
    }
}

impl ISampleUploader for HttpTrainingClient {
    #[instrument(skip(self, sample), fields(sample_id = sample.id, device_id = %sample.device_id))]
    fn upload_sample(&self, sample: &Sample) -> Result<String, RemoteError> {
        let file_name = format!("{}.{}.json", sample.device_id.replace(':', ""), sample.id);
        let mut headers = vec![("x-file-name", file_name.clone())];
        match &sample.label {
            Some(label) => {
                headers.push(("x-label", label.clone()));
                headers.push(("x-no-label", "0".to_string()));
            }
            None => headers.push(("x-no-label", "1".to_string())),
        }

        let body = self.http.post_json_text(
            &format!("{}/api/training/data", self.ingestion_url),
            &IngestionDocument::from_sample(sample),
            &headers,
        )?;
        let remote_id = body.trim();
        Ok(if remote_id.is_empty() {
            file_name
        } else {
            remote_id.to_string()
        })
    }
}
