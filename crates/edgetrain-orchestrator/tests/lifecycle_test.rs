//! Job lifecycle: submission, polling, deployment, failure handling.

mod common;

use std::sync::Barrier;
use std::time::Duration;

use edgetrain_core::errors::RemoteError;
use edgetrain_core::models::{
    DeployOutcome, DeviceStatus, JobState, RemoteJobRef, RemoteJobStatus,
};
use edgetrain_orchestrator::AdvanceOutcome;

use common::{config, harness, harness_with};
use test_fixtures::MockRemote;

#[test]
fn crossing_threshold_creates_and_submits_job() {
    let h = harness(100);
    assert!(h.ingest("dev-1", 99).is_none());
    assert!(h.engine.list_jobs(Some("dev-1")).unwrap().is_empty());

    let job_id = h.ingest("dev-1", 1).expect("100th sample triggers");
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Submitted);
    assert_eq!(job.samples_at_trigger, 100);
    assert_eq!(job.remote_ref.unwrap().as_str(), "remote-1");
    assert_eq!(h.history_states(&job_id), vec!["pending", "submitted"]);

    let stats = h.engine.get_device_stats("dev-1").unwrap();
    assert_eq!(stats.status, DeviceStatus::Training);
    assert_eq!(stats.sample_count, 100);
}

#[test]
fn happy_path_reaches_deployed_and_resets_count() {
    let h = harness(3);
    let job_id = h.ingest("dev-1", 3).unwrap();

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Submitted,
            to: JobState::Training
        }
    );
    // In progress again: only the poll timestamp moves.
    assert_eq!(h.engine.advance_job(&job_id).unwrap(), AdvanceOutcome::Unchanged);
    assert!(h.job(&job_id).last_polled_at.is_some());

    h.remote.push_status(Ok(RemoteJobStatus::Succeeded {
        accuracy: Some(0.93),
    }));
    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Training,
            to: JobState::Deployed
        }
    );

    let job = h.job(&job_id);
    assert_eq!(job.accuracy, Some(0.93));
    assert!(job.completed_at.is_some());
    assert!(job.deploy_started_at.is_some());

    let stats = h.engine.get_device_stats("dev-1").unwrap();
    assert_eq!(stats.sample_count, 0);
    assert_eq!(stats.status, DeviceStatus::Ready);
    assert!(stats.last_trained_at.is_some());

    assert_eq!(
        h.history_states(&job_id),
        vec!["pending", "submitted", "training", "completed", "deploying", "deployed"]
    );
    assert_eq!(h.remote.deploy_calls(), 1);
}

#[test]
fn first_poll_success_still_records_training() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }));

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Submitted,
            to: JobState::Deployed
        }
    );
    assert_eq!(
        h.history_states(&job_id),
        vec!["pending", "submitted", "training", "completed", "deploying", "deployed"]
    );
    assert_eq!(h.remote.status_calls(), 1);
}

#[test]
fn terminal_jobs_are_not_advanced_again() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }));
    h.engine.advance_job(&job_id).unwrap();

    let before = h.job(&job_id);
    let calls = h.remote.status_calls();
    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Terminal(JobState::Deployed)
    );
    assert_eq!(h.job(&job_id), before);
    assert_eq!(h.remote.status_calls(), calls);
}

#[test]
fn deploy_failure_fails_job_and_keeps_count() {
    let h = harness(2);
    let job_id = h.ingest("dev-1", 2).unwrap();
    h.remote
        .push_status(Ok(RemoteJobStatus::Succeeded { accuracy: Some(0.8) }))
        .push_deploy(Ok(DeployOutcome::Failed {
            reason: "model too large for target".into(),
        }));

    h.engine.advance_job(&job_id).unwrap();

    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Failed);
    assert!(job.error.unwrap().contains("model too large"));
    assert_eq!(job.remote_ref.unwrap().as_str(), "remote-1");

    let stats = h.engine.get_device_stats("dev-1").unwrap();
    assert_eq!(stats.status, DeviceStatus::Error);
    assert_eq!(stats.sample_count, 2);
    assert!(stats.last_trained_at.is_none());
}

#[test]
fn remote_training_failure_marks_device_error() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::Failed {
        reason: "not enough data".into(),
    }));

    h.engine.advance_job(&job_id).unwrap();

    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(
        job.error.as_deref(),
        Some("remote training failed: not enough data")
    );
    assert_eq!(
        h.engine.get_device_stats("dev-1").unwrap().status,
        DeviceStatus::Error
    );
}

#[test]
fn rate_limited_three_times_survives_fourth_fails() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::InProgress));
    h.engine.advance_job(&job_id).unwrap();
    assert_eq!(h.job(&job_id).state, JobState::Training);

    let limited = Err(RemoteError::RateLimited {
        reason: "429 Too Many Requests".into(),
    });
    h.remote.push_statuses(4, limited);

    for attempt in 1..=3 {
        assert_eq!(h.engine.advance_job(&job_id).unwrap(), AdvanceOutcome::Unchanged);
        let job = h.job(&job_id);
        assert_eq!(job.state, JobState::Training);
        assert_eq!(job.consecutive_failures, attempt);
    }

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Training,
            to: JobState::Failed
        }
    );
    let job = h.job(&job_id);
    assert!(job.error.unwrap().contains("4 consecutive"));
    assert_eq!(
        h.engine.get_device_stats("dev-1").unwrap().status,
        DeviceStatus::Error
    );
}

#[test]
fn successful_poll_resets_failure_counter() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote
        .push_statuses(
            2,
            Err(RemoteError::Unavailable {
                reason: "503".into(),
            }),
        )
        .push_status(Ok(RemoteJobStatus::InProgress));

    h.engine.advance_job(&job_id).unwrap();
    h.engine.advance_job(&job_id).unwrap();
    assert_eq!(h.job(&job_id).consecutive_failures, 2);

    h.engine.advance_job(&job_id).unwrap();
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Training);
    assert_eq!(job.consecutive_failures, 0);
}

#[test]
fn fatal_remote_error_fails_immediately() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Err(RemoteError::Unauthorized {
        reason: "api key revoked".into(),
    }));

    h.engine.advance_job(&job_id).unwrap();
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Failed);
    assert!(job.error.unwrap().contains("api key revoked"));
}

#[test]
fn transient_submit_error_leaves_job_pending_for_retry() {
    let h = harness(1);
    h.remote.push_start(Err(RemoteError::Unavailable {
        reason: "connection refused".into(),
    }));

    let job_id = h.ingest("dev-1", 1).unwrap();
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Pending);
    assert_eq!(job.consecutive_failures, 1);
    assert!(job.remote_ref.is_none());

    h.engine.advance_job(&job_id).unwrap();
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Submitted);
    assert_eq!(job.consecutive_failures, 0);
    assert_eq!(h.remote.start_calls(), 2);
}

#[test]
fn fatal_submit_error_fails_job() {
    let h = harness(1);
    h.remote.push_start(Err(RemoteError::NotFound {
        reason: "project 42 does not exist".into(),
    }));

    let job_id = h.ingest("dev-1", 1).unwrap();
    assert_eq!(h.job(&job_id).state, JobState::Failed);
    assert_eq!(h.active_jobs("dev-1"), 0);
}

#[test]
fn transient_deploy_error_clears_marker_and_retries() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote
        .push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }))
        .push_deploy(Err(RemoteError::Unavailable {
            reason: "HTTP 503 Service Unavailable".into(),
        }));

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Submitted,
            to: JobState::Deploying
        }
    );
    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Deploying);
    assert!(job.deploy_started_at.is_none());
    assert_eq!(job.consecutive_failures, 1);

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Deploying,
            to: JobState::Deployed
        }
    );
    assert_eq!(h.remote.deploy_calls(), 2);
    assert_eq!(h.engine.get_device_stats("dev-1").unwrap().sample_count, 0);
}

#[test]
fn in_doubt_deploy_is_failed_not_repeated() {
    use edgetrain_core::traits::IJobStore;
    use edgetrain_orchestrator::transitions;

    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();

    // Simulate a crash between arming the deploy marker and the deploy call.
    let job = h.job(&job_id);
    let training = transitions::polled_in_progress(&job, chrono::Utc::now());
    assert!(h.store.commit_transition(&training).unwrap());
    let completed = transitions::training_succeeded(&training.job, None, chrono::Utc::now());
    assert!(h.store.commit_transition(&completed).unwrap());
    let started = transitions::deploy_started(&completed.job, chrono::Utc::now());
    assert!(h.store.commit_transition(&started).unwrap());

    h.engine.advance_job(&job_id).unwrap();

    let job = h.job(&job_id);
    assert_eq!(job.state, JobState::Failed);
    assert!(job.error.unwrap().contains("manual reconciliation"));
    assert_eq!(h.remote.deploy_calls(), 0);
    assert_eq!(
        h.engine.get_device_stats("dev-1").unwrap().status,
        DeviceStatus::Error
    );
}

#[test]
fn history_records_transient_retries() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote.push_status(Err(RemoteError::RateLimited {
        reason: "slow down".into(),
    }));
    h.engine.advance_job(&job_id).unwrap();

    let history = h.engine.job_history(&job_id).unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.from_state, Some(JobState::Submitted));
    assert_eq!(last.to_state, JobState::Submitted);
    assert!(last.detail.as_deref().unwrap().contains("1/4"));
}

#[test]
fn new_job_after_deploy_starts_fresh_count() {
    let h = harness(2);
    let first = h.ingest("dev-1", 2).unwrap();
    h.remote.push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }));
    h.engine.advance_job(&first).unwrap();
    assert_eq!(h.job(&first).state, JobState::Deployed);

    assert!(h.ingest("dev-1", 1).is_none());
    let second = h.ingest("dev-1", 1).unwrap();
    assert_ne!(first, second);
    assert_eq!(h.job(&second).samples_at_trigger, 2);
    assert_eq!(h.job(&second).remote_ref, Some(RemoteJobRef::new("remote-2")));
}

#[test]
fn deploy_with_unknown_outcome_is_failed_not_resent() {
    let h = harness(1);
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote
        .push_status(Ok(RemoteJobStatus::Succeeded { accuracy: None }))
        .push_deploy(Err(RemoteError::OutcomeUnknown {
            reason: "operation timed out".into(),
        }));

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Transitioned {
            from: JobState::Submitted,
            to: JobState::Failed
        }
    );
    let job = h.job(&job_id);
    assert!(job.error.unwrap().contains("manual reconciliation"));

    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Terminal(JobState::Failed)
    );
    assert_eq!(h.remote.deploy_calls(), 1);
    assert_eq!(
        h.engine.get_device_stats("dev-1").unwrap().status,
        DeviceStatus::Error
    );
}

#[test]
fn start_with_unknown_outcome_is_not_resubmitted() {
    let h = harness(1);
    h.remote.push_start(Err(RemoteError::OutcomeUnknown {
        reason: "connection reset".into(),
    }));
    let job_id = h.ingest("dev-1", 1).unwrap();

    assert_eq!(h.job(&job_id).state, JobState::Failed);
    assert_eq!(
        h.engine.advance_job(&job_id).unwrap(),
        AdvanceOutcome::Terminal(JobState::Failed)
    );
    assert_eq!(h.remote.start_calls(), 1);
}

#[test]
fn concurrent_advances_deploy_once() {
    let h = harness_with(
        config(1),
        MockRemote::new().with_latency(Duration::from_millis(40)),
        |builder| builder,
    );
    let job_id = h.ingest("dev-1", 1).unwrap();
    h.remote
        .push_status(Ok(RemoteJobStatus::Succeeded { accuracy: Some(0.9) }));

    let callers = 8;
    let barrier = Barrier::new(callers);
    let outcomes: Vec<AdvanceOutcome> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    h.engine.advance_job(&job_id).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let transitioned = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, AdvanceOutcome::Transitioned { .. }))
        .count();
    assert_eq!(transitioned, 1, "outcomes: {outcomes:?}");
    assert!(outcomes.iter().all(|outcome| matches!(
        outcome,
        AdvanceOutcome::Transitioned { .. }
            | AdvanceOutcome::Busy
            | AdvanceOutcome::Stale
            | AdvanceOutcome::Terminal(JobState::Deployed)
    )));

    assert_eq!(h.job(&job_id).state, JobState::Deployed);
    assert_eq!(h.remote.status_calls(), 1);
    assert_eq!(h.remote.deploy_calls(), 1);
    assert_eq!(
        h.history_states(&job_id)
            .iter()
            .filter(|state| *state == "deployed")
            .count(),
        1
    );
}
