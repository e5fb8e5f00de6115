use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{DeployOutcome, RemoteJobRef, RemoteJobStatus};
use edgetrain_core::traits::IRemoteTrainingClient;

type Script<T> = Mutex<VecDeque<Result<T, RemoteError>>>;

/// Scripted training platform.
///
/// Each operation pops its next scripted response. An exhausted script
/// falls back to the happy path: a fresh remote id, `InProgress`, `Deployed`.
#[derive(Default)]
pub struct MockRemote {
    starts: Script<RemoteJobRef>,
    statuses: Script<RemoteJobStatus>,
    deploys: Script<DeployOutcome>,
    start_calls: AtomicUsize,
    status_calls: AtomicUsize,
    deploy_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, to widen race windows.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_start(&self, response: Result<RemoteJobRef, RemoteError>) -> &Self {
        self.starts.lock().unwrap().push_back(response);
        self
    }

    pub fn push_status(&self, response: Result<RemoteJobStatus, RemoteError>) -> &Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    pub fn push_deploy(&self, response: Result<DeployOutcome, RemoteError>) -> &Self {
        self.deploys.lock().unwrap().push_back(response);
        self
    }

    /// Script `n` consecutive identical status responses.
    pub fn push_statuses(&self, n: usize, response: Result<RemoteJobStatus, RemoteError>) -> &Self {
        for _ in 0..n {
            self.push_status(response.clone());
        }
        self
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
    }
}

impl IRemoteTrainingClient for MockRemote {
    fn start_training(&self, _device_id: &str) -> Result<RemoteJobRef, RemoteError> {
        let n = self.start_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.pause();
        self.starts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteJobRef::new(format!("remote-{n}"))))
    }

    fn get_status(&self, _job: &RemoteJobRef) -> Result<RemoteJobStatus, RemoteError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.pause();
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RemoteJobStatus::InProgress))
    }

    fn deploy(&self, _job: &RemoteJobRef) -> Result<DeployOutcome, RemoteError> {
        let n = self.deploy_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.pause();
        self.deploys.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(DeployOutcome::Deployed {
                deployment_id: format!("deployment-{n}"),
            })
        })
    }
}
