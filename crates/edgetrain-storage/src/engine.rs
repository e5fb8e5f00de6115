//! StorageEngine: owns the ConnectionPool and implements ISampleStore,
//! IDeviceRegistry and IJobStore.

use std::path::Path;

use chrono::Utc;
use tracing::instrument;

use edgetrain_core::config::StorageConfig;
use edgetrain_core::errors::EdgeTrainResult;
use edgetrain_core::models::{
    validate_device_id, Device, DeviceStatus, JobCommit, JobTransitionRecord, NewSample,
    RecordedSample, Sample, TrainingJob,
};
use edgetrain_core::traits::{IDeviceRegistry, IJobStore, ISampleStore};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{device_ops, job_ops, sample_ops, transition_ops};

/// The main storage engine.
pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a storage engine backed by a file on disk, with default settings.
    pub fn open(path: &Path) -> EdgeTrainResult<Self> {
        Self::open_with_config(path, &StorageConfig::default())
    }

    /// Open a file-backed engine with explicit pool and timeout settings.
    pub fn open_with_config(path: &Path, config: &StorageConfig) -> EdgeTrainResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        let engine = Self { pool };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory storage engine (for testing).
    /// All reads go through the writer.
    pub fn open_in_memory() -> EdgeTrainResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self { pool };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> EdgeTrainResult<()> {
        let version = self.pool.writer.with_conn(migrations::run_migrations)?;
        tracing::debug!(schema_version = version, "storage initialized");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Execute a read-only query on the best available connection.
    /// File-backed: uses the read pool (no writer contention).
    /// In-memory: uses the writer.
    fn with_reader<F, T>(&self, f: F) -> EdgeTrainResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> EdgeTrainResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_conn(f),
            None => self.pool.writer.with_conn(f),
        }
    }
}

impl ISampleStore for StorageEngine {
    #[instrument(skip(self, sample), fields(device_id = %sample.device_id))]
    fn record_sample(&self, sample: &NewSample) -> EdgeTrainResult<RecordedSample> {
        sample.validate()?;
        self.pool
            .writer
            .with_conn(|conn| sample_ops::insert_sample(conn, sample))
    }

    fn get_sample(&self, id: i64) -> EdgeTrainResult<Option<Sample>> {
        self.with_reader(|conn| sample_ops::get_sample(conn, id))
    }

    fn pending_uploads(&self, limit: usize) -> EdgeTrainResult<Vec<Sample>> {
        self.with_reader(|conn| sample_ops::pending_uploads(conn, limit))
    }

    fn mark_uploaded(&self, sample_id: i64, remote_sample_id: Option<&str>) -> EdgeTrainResult<()> {
        self.pool
            .writer
            .with_conn(|conn| sample_ops::mark_uploaded(conn, sample_id, remote_sample_id))
    }

    fn record_upload_failure(&self, sample_id: i64, error: &str) -> EdgeTrainResult<()> {
        self.pool
            .writer
            .with_conn(|conn| sample_ops::record_upload_failure(conn, sample_id, error))
    }

    fn count_samples(&self, device_id: &str) -> EdgeTrainResult<u64> {
        self.with_reader(|conn| sample_ops::count_samples(conn, device_id))
    }
}

impl IDeviceRegistry for StorageEngine {
    fn register_device(&self, device_id: &str) -> EdgeTrainResult<Device> {
        validate_device_id(device_id)?;
        self.pool.writer.with_conn(|conn| {
            if device_ops::ensure_device(conn, device_id, Utc::now())? {
                tracing::info!(device_id, "device registered");
            }
            device_ops::require_device(conn, device_id)
        })
    }

    fn get_device(&self, device_id: &str) -> EdgeTrainResult<Option<Device>> {
        self.with_reader(|conn| device_ops::get_device(conn, device_id))
    }

    fn list_devices(&self) -> EdgeTrainResult<Vec<Device>> {
        self.with_reader(device_ops::list_devices)
    }

    fn set_device_status(&self, device_id: &str, status: DeviceStatus) -> EdgeTrainResult<()> {
        self.pool
            .writer
            .with_conn(|conn| device_ops::set_status(conn, device_id, status, Utc::now()))
    }
}

impl IJobStore for StorageEngine {
    #[instrument(skip(self, job), fields(job_id = %job.id, device_id = %job.device_id))]
    fn insert_job(&self, job: &TrainingJob, device_status: DeviceStatus) -> EdgeTrainResult<()> {
        self.pool
            .writer
            .with_conn(|conn| job_ops::insert_job(conn, job, device_status))
    }

    fn get_job(&self, job_id: &str) -> EdgeTrainResult<Option<TrainingJob>> {
        self.with_reader(|conn| job_ops::get_job(conn, job_id))
    }

    fn list_jobs(&self, device_id: Option<&str>) -> EdgeTrainResult<Vec<TrainingJob>> {
        self.with_reader(|conn| job_ops::list_jobs(conn, device_id))
    }

    fn active_job_for_device(&self, device_id: &str) -> EdgeTrainResult<Option<TrainingJob>> {
        // Read through the writer: callers use this to decide whether a new
        // job may be created, so it must not lag behind the last commit.
        self.pool
            .writer
            .with_conn(|conn| job_ops::active_job_for_device(conn, device_id))
    }

    fn active_job_ids(&self) -> EdgeTrainResult<Vec<String>> {
        self.with_reader(job_ops::active_job_ids)
    }

    #[instrument(skip(self, commit), fields(job_id = %commit.job.id, to = %commit.job.state))]
    fn commit_transition(&self, commit: &JobCommit) -> EdgeTrainResult<bool> {
        self.pool
            .writer
            .with_conn(|conn| job_ops::commit_transition(conn, commit))
    }

    fn transition_history(&self, job_id: &str) -> EdgeTrainResult<Vec<JobTransitionRecord>> {
        self.with_reader(|conn| transition_ops::history(conn, job_id))
    }
}
