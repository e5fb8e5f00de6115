//! Training job rows: insert under the one-active-job index, reads, and the
//! compare-and-swap transition commit.

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult};
use edgetrain_core::models::{
    DeviceEffect, DeviceStatus, JobCommit, JobState, RemoteJobRef, TrainingJob, TriggerReason,
};

use super::{device_ops, parse_enum, parse_opt_ts, parse_ts, transition_ops};
use crate::to_storage_err;

const TABLE: &str = "training_jobs";

const JOB_COLUMNS: &str = "id, device_id, reason, state, remote_ref, samples_at_trigger, \
     accuracy, error, consecutive_failures, deploy_started_at, created_at, last_polled_at, \
     completed_at, version";

/// States a job may be in while it still occupies its device.
const ACTIVE_FILTER: &str = "state NOT IN ('deployed', 'failed')";

struct JobRow {
    id: String,
    device_id: String,
    reason: String,
    state: String,
    remote_ref: Option<String>,
    samples_at_trigger: i64,
    accuracy: Option<f64>,
    error: Option<String>,
    consecutive_failures: i64,
    deploy_started_at: Option<String>,
    created_at: String,
    last_polled_at: Option<String>,
    completed_at: Option<String>,
    version: i64,
}

impl JobRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            device_id: row.get(1)?,
            reason: row.get(2)?,
            state: row.get(3)?,
            remote_ref: row.get(4)?,
            samples_at_trigger: row.get(5)?,
            accuracy: row.get(6)?,
            error: row.get(7)?,
            consecutive_failures: row.get(8)?,
            deploy_started_at: row.get(9)?,
            created_at: row.get(10)?,
            last_polled_at: row.get(11)?,
            completed_at: row.get(12)?,
            version: row.get(13)?,
        })
    }

    fn into_job(self) -> EdgeTrainResult<TrainingJob> {
        Ok(TrainingJob {
            id: self.id,
            device_id: self.device_id,
            reason: parse_enum::<TriggerReason>(TABLE, &self.reason)?,
            state: parse_enum::<JobState>(TABLE, &self.state)?,
            remote_ref: self.remote_ref.map(RemoteJobRef::new),
            samples_at_trigger: self.samples_at_trigger.max(0) as u64,
            accuracy: self.accuracy,
            error: self.error,
            consecutive_failures: self.consecutive_failures.clamp(0, u32::MAX as i64) as u32,
            deploy_started_at: parse_opt_ts(TABLE, self.deploy_started_at)?,
            created_at: parse_ts(TABLE, &self.created_at)?,
            last_polled_at: parse_opt_ts(TABLE, self.last_polled_at)?,
            completed_at: parse_opt_ts(TABLE, self.completed_at)?,
            version: self.version.max(0) as u64,
        })
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Insert a `pending` job and move its device to `device_status`.
///
/// The partial unique index rejects a second active job for the device; that
/// surfaces as `Conflict` carrying the job already holding the slot.
pub fn insert_job(
    conn: &Connection,
    job: &TrainingJob,
    device_status: DeviceStatus,
) -> EdgeTrainResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("insert_job begin: {e}")))?;

    match insert_job_inner(&tx, job, device_status) {
        Ok(()) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("insert_job commit: {e}")))?;
            Ok(())
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn insert_job_inner(
    conn: &Connection,
    job: &TrainingJob,
    device_status: DeviceStatus,
) -> EdgeTrainResult<()> {
    device_ops::require_device(conn, &job.device_id)?;

    let inserted = conn.execute(
        "INSERT INTO training_jobs (
            id, device_id, reason, state, remote_ref, samples_at_trigger, accuracy, error,
            consecutive_failures, deploy_started_at, created_at, last_polled_at,
            completed_at, version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            job.id,
            job.device_id,
            job.reason.as_str(),
            job.state.as_str(),
            job.remote_ref.as_ref().map(RemoteJobRef::as_str),
            job.samples_at_trigger as i64,
            job.accuracy,
            job.error,
            job.consecutive_failures,
            job.deploy_started_at.map(|t| t.to_rfc3339()),
            job.created_at.to_rfc3339(),
            job.last_polled_at.map(|t| t.to_rfc3339()),
            job.completed_at.map(|t| t.to_rfc3339()),
            job.version as i64,
        ],
    );

    if let Err(e) = inserted {
        if is_constraint_violation(&e) {
            if let Some(active) = active_job_for_device(conn, &job.device_id)? {
                return Err(EdgeTrainError::Conflict {
                    device_id: job.device_id.clone(),
                    active_job_id: active.id,
                });
            }
        }
        return Err(to_storage_err(e.to_string()));
    }

    device_ops::set_status(conn, &job.device_id, device_status, job.created_at)?;
    transition_ops::append(
        conn,
        &job.id,
        None,
        job.state,
        Some(&format!("created ({})", job.reason)),
        job.created_at,
    )?;
    Ok(())
}

pub fn get_job(conn: &Connection, job_id: &str) -> EdgeTrainResult<Option<TrainingJob>> {
    let row = conn
        .query_row(
            &format!("SELECT {JOB_COLUMNS} FROM training_jobs WHERE id = ?1"),
            params![job_id],
            JobRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(JobRow::into_job).transpose()
}

/// Jobs in creation order, optionally for one device.
pub fn list_jobs(conn: &Connection, device_id: Option<&str>) -> EdgeTrainResult<Vec<TrainingJob>> {
    let sql = match device_id {
        Some(_) => format!("SELECT {JOB_COLUMNS} FROM training_jobs WHERE device_id = ?1 ORDER BY seq"),
        None => format!("SELECT {JOB_COLUMNS} FROM training_jobs ORDER BY seq"),
    };
    let mut stmt = conn.prepare(&sql).map_err(|e| to_storage_err(e.to_string()))?;
    let rows = match device_id {
        Some(id) => stmt.query_map(params![id], JobRow::from_row),
        None => stmt.query_map([], JobRow::from_row),
    }
    .map_err(|e| to_storage_err(e.to_string()))?;

    let mut jobs = Vec::new();
    for row in rows {
        let row = row.map_err(|e| to_storage_err(e.to_string()))?;
        jobs.push(row.into_job()?);
    }
    Ok(jobs)
}

pub fn active_job_for_device(
    conn: &Connection,
    device_id: &str,
) -> EdgeTrainResult<Option<TrainingJob>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {JOB_COLUMNS} FROM training_jobs
                 WHERE device_id = ?1 AND {ACTIVE_FILTER}
                 ORDER BY seq LIMIT 1"
            ),
            params![device_id],
            JobRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(JobRow::into_job).transpose()
}

pub fn active_job_ids(conn: &Connection) -> EdgeTrainResult<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT id FROM training_jobs WHERE {ACTIVE_FILTER} ORDER BY seq"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply a compare-and-swap commit.
///
/// The row is written only if it still carries `expected_version` and
/// `from_state`. On success the version is bumped, the device effect applied
/// and, for state changes, a history row appended, all in one transaction.
/// Returns `false` for a stale commit.
pub fn commit_transition(conn: &Connection, commit: &JobCommit) -> EdgeTrainResult<bool> {
    if !commit.from_state.can_transition_to(commit.job.state) {
        return Err(EdgeTrainError::InvalidTransition {
            from: commit.from_state,
            to: commit.job.state,
        });
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("commit_transition begin: {e}")))?;

    match commit_transition_inner(&tx, commit) {
        Ok(true) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("commit_transition commit: {e}")))?;
            Ok(true)
        }
        Ok(false) => {
            let _ = tx.rollback();
            Ok(false)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn commit_transition_inner(conn: &Connection, commit: &JobCommit) -> EdgeTrainResult<bool> {
    let job = &commit.job;
    let updated = conn
        .execute(
            "UPDATE training_jobs SET
                state = ?3,
                remote_ref = ?4,
                accuracy = ?5,
                error = ?6,
                consecutive_failures = ?7,
                deploy_started_at = ?8,
                last_polled_at = ?9,
                completed_at = ?10,
                version = version + 1
             WHERE id = ?1 AND version = ?2 AND state = ?11",
            params![
                job.id,
                commit.expected_version as i64,
                job.state.as_str(),
                job.remote_ref.as_ref().map(RemoteJobRef::as_str),
                job.accuracy,
                job.error,
                job.consecutive_failures,
                job.deploy_started_at.map(|t| t.to_rfc3339()),
                job.last_polled_at.map(|t| t.to_rfc3339()),
                job.completed_at.map(|t| t.to_rfc3339()),
                commit.from_state.as_str(),
            ],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    if updated == 0 {
        tracing::debug!(
            job_id = %job.id,
            expected_version = commit.expected_version,
            "stale job commit discarded"
        );
        return Ok(false);
    }

    let now = Utc::now();
    match &commit.device_effect {
        Some(DeviceEffect::SetStatus(status)) => {
            device_ops::set_status(conn, &job.device_id, *status, now)?;
        }
        Some(DeviceEffect::ResetAfterDeploy { trained_at }) => {
            device_ops::reset_after_deploy(conn, &job.device_id, *trained_at)?;
        }
        None => {}
    }

    if commit.from_state != job.state || commit.detail.is_some() {
        transition_ops::append(
            conn,
            &job.id,
            Some(commit.from_state),
            job.state,
            commit.detail.as_deref(),
            now,
        )?;
    }
    Ok(true)
}
