//! Property tests: sample counting and the one-active-job invariant.

use proptest::prelude::*;

use edgetrain_core::models::{DeviceStatus, NewSample, TrainingJob, TriggerReason};
use edgetrain_core::traits::{IDeviceRegistry, IJobStore, ISampleStore};
use edgetrain_storage::StorageEngine;
use serde_json::json;

fn sample(device_id: &str) -> NewSample {
    NewSample {
        device_id: device_id.to_string(),
        sensor_type: "gyro".to_string(),
        sample_rate: 50.0,
        payload: json!({ "x": 1 }),
        label: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_device_count_matches_ingested(devices in prop::collection::vec(0u8..4, 1..40)) {
        let engine = StorageEngine::open_in_memory().unwrap();
        let mut expected = [0u64; 4];
        for d in &devices {
            engine.record_sample(&sample(&format!("dev-{d}"))).unwrap();
            expected[*d as usize] += 1;
        }
        for (d, count) in expected.iter().enumerate() {
            let stored = engine
                .get_device(&format!("dev-{d}"))
                .unwrap()
                .map(|dev| dev.sample_count)
                .unwrap_or(0);
            prop_assert_eq!(stored, *count);
        }
    }

    #[test]
    fn prop_at_most_one_active_job(attempts in 1usize..10) {
        let engine = StorageEngine::open_in_memory().unwrap();
        engine.register_device("dev-p").unwrap();
        let mut ok = 0;
        for _ in 0..attempts {
            let job = TrainingJob::new("dev-p", TriggerReason::Manual, 0);
            if engine.insert_job(&job, DeviceStatus::Training).is_ok() {
                ok += 1;
            }
        }
        prop_assert_eq!(ok, 1);
        prop_assert_eq!(engine.active_job_ids().unwrap().len(), 1);
    }
}
