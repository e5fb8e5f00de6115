#![allow(dead_code)]

use std::sync::Arc;

use edgetrain_core::config::TrainingConfig;
use edgetrain_core::models::{JobTransitionRecord, TrainingJob};
use edgetrain_orchestrator::{EdgeTrainEngine, EngineBuilder};
use edgetrain_storage::StorageEngine;
use test_fixtures::{new_sample, MockRemote};

pub struct Harness {
    pub engine: EdgeTrainEngine,
    pub store: Arc<StorageEngine>,
    pub remote: Arc<MockRemote>,
}

pub fn config(threshold: u64) -> TrainingConfig {
    TrainingConfig {
        threshold,
        ..TrainingConfig::default()
    }
}

pub fn harness(threshold: u64) -> Harness {
    harness_with(config(threshold), MockRemote::new(), |builder| builder)
}

pub fn harness_with(
    config: TrainingConfig,
    remote: MockRemote,
    customize: impl FnOnce(EngineBuilder) -> EngineBuilder,
) -> Harness {
    let store = Arc::new(StorageEngine::open_in_memory().unwrap());
    let remote = Arc::new(remote);
    let builder = EdgeTrainEngine::builder(store.clone(), remote.clone()).config(config);
    Harness {
        engine: customize(builder).build(),
        store,
        remote,
    }
}

impl Harness {
    /// Record `n` accelerometer samples for `device_id`.
    pub fn ingest(&self, device_id: &str, n: usize) -> Option<String> {
        let mut triggered = None;
        for _ in 0..n {
            let ack = self.engine.record_sample(&new_sample(device_id)).unwrap();
            triggered = triggered.or(ack.triggered_job);
        }
        triggered
    }

    pub fn job(&self, job_id: &str) -> TrainingJob {
        self.engine.get_job(job_id).unwrap()
    }

    pub fn history_states(&self, job_id: &str) -> Vec<String> {
        self.engine
            .job_history(job_id)
            .unwrap()
            .iter()
            .map(|r: &JobTransitionRecord| r.to_state.to_string())
            .collect()
    }

    pub fn active_jobs(&self, device_id: &str) -> usize {
        self.engine
            .list_jobs(Some(device_id))
            .unwrap()
            .iter()
            .filter(|job| !job.is_terminal())
            .count()
    }
}
