//! Sample ingestion hook, virtual-device pulls, and the upload pass.

mod common;

use std::sync::Arc;

use edgetrain_core::errors::{EdgeTrainError, RemoteError};
use edgetrain_core::models::{JobState, NewSample};
use edgetrain_core::traits::ISampleStore;
use serde_json::json;
use test_fixtures::{new_sample, sample_from_fixture, MockRemote, MockUploader, MockVirtualDevice};

use common::{config, harness, harness_with};

#[test]
fn ack_reports_running_count() {
    let h = harness(100);
    let first = h.engine.record_sample(&new_sample("dev-1")).unwrap();
    let second = h
        .engine
        .record_sample(&sample_from_fixture("dev-1", "temperature"))
        .unwrap();
    assert_eq!(first.device_sample_count, 1);
    assert_eq!(second.device_sample_count, 2);
    assert!(second.sample_id > first.sample_id);
    assert_eq!(second.device_id, "dev-1");
    assert!(second.triggered_job.is_none());
    assert_eq!(h.engine.metrics().samples_ingested, 2);
}

#[test]
fn invalid_sample_changes_nothing() {
    let h = harness(1);
    let mut sample = new_sample("dev-1");
    sample.sample_rate = 0.0;
    assert!(matches!(
        h.engine.record_sample(&sample),
        Err(EdgeTrainError::Validation { .. })
    ));
    assert!(matches!(
        h.engine.get_device_stats("dev-1"),
        Err(EdgeTrainError::DeviceNotFound { .. })
    ));
    assert!(h.engine.list_jobs(None).unwrap().is_empty());
}

#[test]
fn pull_records_each_sample_and_triggers() {
    let readings: Vec<NewSample> = (0..3).map(|_| new_sample("vd-1")).collect();
    let source = MockVirtualDevice::new().with_samples("vd-1", readings);
    let h = harness_with(config(3), MockRemote::new(), |b| {
        b.virtual_device(Arc::new(source))
    });

    let report = h.engine.pull_from_virtual_device("vd-1").unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.recorded, 3);
    assert_eq!(report.rejected, 0);

    let jobs = h.engine.list_jobs(Some("vd-1")).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].state, JobState::Submitted);
}

#[test]
fn pull_skips_invalid_readings() {
    let bad = NewSample {
        device_id: "vd-1".into(),
        sensor_type: "".into(),
        sample_rate: 10.0,
        payload: json!([1]),
        label: None,
    };
    let source = MockVirtualDevice::new().with_samples("vd-1", vec![new_sample("vd-1"), bad]);
    let h = harness_with(config(100), MockRemote::new(), |b| {
        b.virtual_device(Arc::new(source))
    });

    let report = h.engine.pull_from_virtual_device("vd-1").unwrap();
    assert_eq!(report.recorded, 1);
    assert_eq!(report.rejected, 1);
}

#[test]
fn pull_surfaces_remote_errors() {
    let source = MockVirtualDevice::new().with_error(
        "vd-1",
        RemoteError::Unauthorized {
            reason: "bad token".into(),
        },
    );
    let h = harness_with(config(3), MockRemote::new(), |b| {
        b.virtual_device(Arc::new(source))
    });
    assert!(matches!(
        h.engine.pull_from_virtual_device("vd-1"),
        Err(EdgeTrainError::RemoteFatal(RemoteError::Unauthorized { .. }))
    ));
    assert!(matches!(
        h.engine.pull_from_virtual_device("vd-2"),
        Err(EdgeTrainError::RemoteFatal(RemoteError::NotFound { .. }))
    ));
}

#[test]
fn pull_without_source_is_config_error() {
    let h = harness(3);
    assert!(matches!(
        h.engine.pull_from_virtual_device("vd-1"),
        Err(EdgeTrainError::ConfigError(_))
    ));
    assert!(matches!(
        h.engine.upload_pending(10),
        Err(EdgeTrainError::ConfigError(_))
    ));
}

#[test]
fn upload_marks_samples_and_retries_failures() {
    let uploader = Arc::new(MockUploader::new());
    let h = harness_with(config(100), MockRemote::new(), {
        let uploader = Arc::clone(&uploader);
        move |b| b.uploader(uploader)
    });
    let ids: Vec<i64> = (0..4)
        .map(|_| h.engine.record_sample(&new_sample("dev-1")).unwrap().sample_id)
        .collect();
    uploader.fail_sample(ids[2]);

    let report = h.engine.upload_pending(10).unwrap();
    assert_eq!(report.uploaded, 3);
    assert_eq!(report.failed, 1);

    let uploaded = h.store.get_sample(ids[0]).unwrap().unwrap();
    assert!(uploaded.uploaded);
    assert_eq!(uploaded.remote_sample_id.as_deref(), Some(&*format!("ei-{}", ids[0])));
    assert!(!h.store.get_sample(ids[2]).unwrap().unwrap().uploaded);

    uploader.heal_sample(ids[2]);
    let report = h.engine.upload_pending(10).unwrap();
    assert_eq!(report.uploaded, 1);
    assert!(h.store.pending_uploads(10).unwrap().is_empty());
    assert_eq!(uploader.uploaded().len(), 4);
}

#[test]
fn upload_respects_limit() {
    let uploader = Arc::new(MockUploader::new());
    let h = harness_with(config(100), MockRemote::new(), {
        let uploader = Arc::clone(&uploader);
        move |b| b.uploader(uploader)
    });
    h.ingest("dev-1", 5);

    assert_eq!(h.engine.upload_pending(2).unwrap().uploaded, 2);
    assert_eq!(h.store.pending_uploads(10).unwrap().len(), 3);
    assert_eq!(h.engine.upload_pending(0).unwrap().uploaded, 0);
}

#[test]
fn rejected_samples_do_not_starve_newer_ones() {
    let uploader = Arc::new(MockUploader::new());
    let h = harness_with(config(100), MockRemote::new(), {
        let uploader = Arc::clone(&uploader);
        move |b| b.uploader(uploader)
    });
    let ids: Vec<i64> = (0..3)
        .map(|_| h.engine.record_sample(&new_sample("dev-1")).unwrap().sample_id)
        .collect();
    uploader.fail_sample(ids[0]);
    uploader.fail_sample(ids[1]);

    let first = h.engine.upload_pending(2).unwrap();
    assert_eq!((first.uploaded, first.failed), (0, 2));

    let second = h.engine.upload_pending(2).unwrap();
    assert_eq!(second.uploaded, 1);
    assert!(h.store.get_sample(ids[2]).unwrap().unwrap().uploaded);

    let stuck = h.store.get_sample(ids[0]).unwrap().unwrap();
    assert!(!stuck.uploaded);
    assert!(stuck.upload_attempts >= 1);
    assert!(stuck.last_upload_error.is_some());
}
