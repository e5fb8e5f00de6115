//! Trigger paths: threshold evaluation, manual triggers, and the
//! one-active-job rule under concurrency.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use edgetrain_core::errors::EdgeTrainError;
use edgetrain_core::models::{DeviceStatus, JobState, RemoteJobStatus, TriggerReason};
use edgetrain_core::traits::IDeviceRegistry;
use edgetrain_orchestrator::{TriggerDecision, TriggerOutcome};
use proptest::prelude::*;
use test_fixtures::{new_sample, MockRemote};

use common::{config, harness, harness_with};

#[test]
fn below_threshold_never_creates_job() {
    let h = harness(10);
    h.ingest("dev-1", 9);
    let outcome = h.engine.orchestrator().evaluate_and_trigger("dev-1").unwrap();
    assert_eq!(
        outcome,
        TriggerOutcome::Skipped(TriggerDecision::BelowThreshold {
            count: 9,
            threshold: 10
        })
    );
    assert!(h.engine.list_jobs(None).unwrap().is_empty());
    assert_eq!(h.remote.start_calls(), 0);
}

#[test]
fn samples_past_threshold_do_not_stack_jobs() {
    let h = harness(5);
    let job_id = h.ingest("dev-1", 5).unwrap();
    assert!(h.ingest("dev-1", 20).is_none());

    let jobs = h.engine.list_jobs(Some("dev-1")).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, job_id);
    assert_eq!(h.engine.get_device_stats("dev-1").unwrap().sample_count, 25);
}

#[test]
fn auto_trigger_disabled_only_counts() {
    let mut cfg = config(2);
    cfg.auto_trigger = false;
    let h = harness_with(cfg, MockRemote::new(), |b| b);
    assert!(h.ingest("dev-1", 5).is_none());
    assert!(h.engine.list_jobs(None).unwrap().is_empty());

    let job_id = h
        .engine
        .trigger_training("dev-1", TriggerReason::Threshold)
        .unwrap();
    assert_eq!(h.job(&job_id).state, JobState::Submitted);
}

#[test]
fn manual_trigger_ignores_threshold() {
    let h = harness(1000);
    h.ingest("dev-1", 3);
    let job_id = h
        .engine
        .trigger_training("dev-1", TriggerReason::Manual)
        .unwrap();
    let job = h.job(&job_id);
    assert_eq!(job.reason, TriggerReason::Manual);
    assert_eq!(job.samples_at_trigger, 3);
    assert_eq!(job.state, JobState::Submitted);
}

#[test]
fn manual_trigger_while_training_conflicts() {
    let h = harness(2);
    let job_id = h.ingest("dev-1", 2).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::InProgress));
    h.engine.advance_job(&job_id).unwrap();
    assert_eq!(h.job(&job_id).state, JobState::Training);

    let err = h
        .engine
        .trigger_training("dev-1", TriggerReason::Manual)
        .unwrap_err();
    match err {
        EdgeTrainError::Conflict {
            device_id,
            active_job_id,
        } => {
            assert_eq!(device_id, "dev-1");
            assert_eq!(active_job_id, job_id);
        }
        other => panic!("expected conflict, got {other}"),
    }
    assert_eq!(h.engine.list_jobs(Some("dev-1")).unwrap().len(), 1);
    assert_eq!(h.engine.metrics().conflicts, 1);
}

#[test]
fn threshold_trigger_errors_explain_why() {
    let h = harness(10);
    h.ingest("dev-1", 4);
    assert!(matches!(
        h.engine.trigger_training("dev-1", TriggerReason::Threshold),
        Err(EdgeTrainError::Validation { .. })
    ));
    assert!(matches!(
        h.engine.trigger_training("ghost", TriggerReason::Threshold),
        Err(EdgeTrainError::DeviceNotFound { .. })
    ));
    assert!(matches!(
        h.engine.trigger_training("ghost", TriggerReason::Manual),
        Err(EdgeTrainError::DeviceNotFound { .. })
    ));
    assert!(matches!(
        h.engine.trigger_training("bad id!", TriggerReason::Manual),
        Err(EdgeTrainError::Validation { .. })
    ));
}

#[test]
fn error_devices_accept_samples_but_do_not_auto_trigger() {
    let h = harness(3);
    h.ingest("dev-1", 1);
    h.store
        .set_device_status("dev-1", DeviceStatus::Error)
        .unwrap();

    assert!(h.ingest("dev-1", 10).is_none());
    assert_eq!(h.engine.get_device_stats("dev-1").unwrap().sample_count, 11);
    assert!(h.engine.list_jobs(None).unwrap().is_empty());

    // An operator can still force a run.
    let job_id = h
        .engine
        .trigger_training("dev-1", TriggerReason::Manual)
        .unwrap();
    assert_eq!(h.job(&job_id).state, JobState::Submitted);
    assert_eq!(
        h.engine.get_device_stats("dev-1").unwrap().status,
        DeviceStatus::Training
    );
}

#[test]
fn registered_device_starts_idle() {
    let h = harness(3);
    let device = h.engine.register_device("aa:bb:cc:dd:ee:ff").unwrap();
    assert_eq!(device.status, DeviceStatus::Idle);
    assert_eq!(device.sample_count, 0);
    assert_eq!(h.engine.list_devices().unwrap().len(), 1);
    assert!(h.engine.register_device("").is_err());
}

#[test]
fn concurrent_threshold_crossings_create_one_job() {
    let h = Arc::new(harness_with(
        config(10),
        MockRemote::new().with_latency(Duration::from_millis(5)),
        |b| b,
    ));
    h.ingest("dev-1", 9);

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let h = Arc::clone(&h);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                h.engine.record_sample(&new_sample("dev-1")).unwrap()
            })
        })
        .collect();

    let acks: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    let triggered: Vec<_> = acks.iter().filter_map(|a| a.triggered_job.clone()).collect();
    assert_eq!(triggered.len(), 1);
    assert_eq!(h.engine.list_jobs(Some("dev-1")).unwrap().len(), 1);
    assert_eq!(h.remote.start_calls(), 1);
    assert_eq!(h.engine.get_device_stats("dev-1").unwrap().sample_count, 15);
}

#[test]
fn concurrent_manual_triggers_yield_one_job_and_conflicts() {
    let h = Arc::new(harness(1000));
    h.ingest("dev-1", 1);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let h = Arc::clone(&h);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                h.engine.trigger_training("dev-1", TriggerReason::Manual)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    let created = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(EdgeTrainError::Conflict { .. })))
        .count();
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(h.active_jobs("dev-1"), 1);
}

#[derive(Debug, Clone)]
enum Op {
    Ingest(usize, u8),
    Manual(usize),
    Advance,
    Succeed,
    Fail,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 1..6u8).prop_map(|(d, n)| Op::Ingest(d, n)),
        (0..3usize).prop_map(Op::Manual),
        Just(Op::Advance),
        Just(Op::Succeed),
        Just(Op::Fail),
    ]
}

const DEVICES: [&str; 3] = ["dev-a", "dev-b", "dev-c"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn at_most_one_active_job_per_device(ops in prop::collection::vec(op(), 1..40)) {
        let h = harness(4);
        for op in ops {
            match op {
                Op::Ingest(d, n) => {
                    h.ingest(DEVICES[d], n as usize);
                }
                Op::Manual(d) => {
                    let _ = h.engine.trigger_training(DEVICES[d], TriggerReason::Manual);
                }
                Op::Advance => {
                    h.engine.poll_once();
                }
                Op::Succeed => {
                    h.remote.push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }));
                }
                Op::Fail => {
                    h.remote.push_status(Ok(RemoteJobStatus::Failed { reason: "diverged".into() }));
                }
            }
            for device in DEVICES {
                prop_assert!(h.active_jobs(device) <= 1);
            }
        }

        for job in h.engine.list_jobs(None).unwrap() {
            if job.state == JobState::Deployed {
                prop_assert!(job.completed_at.is_some());
            }
        }
    }
}
