//! Sample rows. Insert + device count increment share one transaction.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult};
use edgetrain_core::models::{NewSample, RecordedSample, Sample};

use super::{device_ops, parse_ts};
use crate::to_storage_err;

const TABLE: &str = "samples";

const SAMPLE_COLUMNS: &str = "id, device_id, sensor_type, sample_rate, payload, label, \
     uploaded, remote_sample_id, upload_attempts, last_upload_error, created_at";

struct SampleRow {
    id: i64,
    device_id: String,
    sensor_type: String,
    sample_rate: f64,
    payload: String,
    label: Option<String>,
    uploaded: bool,
    remote_sample_id: Option<String>,
    upload_attempts: i64,
    last_upload_error: Option<String>,
    created_at: String,
}

impl SampleRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            device_id: row.get(1)?,
            sensor_type: row.get(2)?,
            sample_rate: row.get(3)?,
            payload: row.get(4)?,
            label: row.get(5)?,
            uploaded: row.get(6)?,
            remote_sample_id: row.get(7)?,
            upload_attempts: row.get(8)?,
            last_upload_error: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn into_sample(self) -> EdgeTrainResult<Sample> {
        Ok(Sample {
            id: self.id,
            device_id: self.device_id,
            sensor_type: self.sensor_type,
            sample_rate: self.sample_rate,
            payload: serde_json::from_str(&self.payload)?,
            label: self.label,
            uploaded: self.uploaded,
            remote_sample_id: self.remote_sample_id,
            upload_attempts: self.upload_attempts.clamp(0, u32::MAX as i64) as u32,
            last_upload_error: self.last_upload_error,
            created_at: parse_ts(TABLE, &self.created_at)?,
        })
    }
}

/// Store a sample, registering its device on first sight, and increment the
/// device's sample count. All-or-nothing.
pub fn insert_sample(conn: &Connection, sample: &NewSample) -> EdgeTrainResult<RecordedSample> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("insert_sample begin: {e}")))?;

    match insert_sample_inner(&tx, sample) {
        Ok(recorded) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("insert_sample commit: {e}")))?;
            Ok(recorded)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

fn insert_sample_inner(conn: &Connection, sample: &NewSample) -> EdgeTrainResult<RecordedSample> {
    let now = Utc::now();
    device_ops::ensure_device(conn, &sample.device_id, now)?;

    let payload = serde_json::to_string(&sample.payload)?;
    conn.execute(
        "INSERT INTO samples (device_id, sensor_type, sample_rate, payload, label, uploaded, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
        params![
            sample.device_id,
            sample.sensor_type,
            sample.sample_rate,
            payload,
            sample.label,
            now.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    let id = conn.last_insert_rowid();

    let device_sample_count = device_ops::increment_sample_count(conn, &sample.device_id, now)?;

    Ok(RecordedSample {
        sample: Sample {
            id,
            device_id: sample.device_id.clone(),
            sensor_type: sample.sensor_type.clone(),
            sample_rate: sample.sample_rate,
            payload: sample.payload.clone(),
            label: sample.label.clone(),
            uploaded: false,
            remote_sample_id: None,
            upload_attempts: 0,
            last_upload_error: None,
            created_at: now,
        },
        device_sample_count,
    })
}

pub fn get_sample(conn: &Connection, id: i64) -> EdgeTrainResult<Option<Sample>> {
    let row = conn
        .query_row(
            &format!("SELECT {SAMPLE_COLUMNS} FROM samples WHERE id = ?1"),
            params![id],
            SampleRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(SampleRow::into_sample).transpose()
}

/// Samples not yet pushed to the platform. Ordering by attempts first keeps
/// a run of rejected samples from starving newer ones.
pub fn pending_uploads(conn: &Connection, limit: usize) -> EdgeTrainResult<Vec<Sample>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM samples
             WHERE uploaded = 0
             ORDER BY upload_attempts, id
             LIMIT ?1"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![limit as i64], SampleRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut samples = Vec::new();
    for row in rows {
        let row = row.map_err(|e| to_storage_err(e.to_string()))?;
        samples.push(row.into_sample()?);
    }
    Ok(samples)
}

pub fn mark_uploaded(
    conn: &Connection,
    sample_id: i64,
    remote_sample_id: Option<&str>,
) -> EdgeTrainResult<()> {
    let updated = conn
        .execute(
            "UPDATE samples SET uploaded = 1, remote_sample_id = ?2, last_upload_error = NULL
             WHERE id = ?1",
            params![sample_id, remote_sample_id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(EdgeTrainError::validation(format!(
            "sample {sample_id} does not exist"
        )));
    }
    Ok(())
}

pub fn record_upload_failure(conn: &Connection, sample_id: i64, error: &str) -> EdgeTrainResult<()> {
    let updated = conn
        .execute(
            "UPDATE samples SET upload_attempts = upload_attempts + 1, last_upload_error = ?2
             WHERE id = ?1 AND uploaded = 0",
            params![sample_id, error],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(EdgeTrainError::validation(format!(
            "sample {sample_id} does not exist or is already uploaded"
        )));
    }
    Ok(())
}

pub fn count_samples(conn: &Connection, device_id: &str) -> EdgeTrainResult<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM samples WHERE device_id = ?1",
            params![device_id],
            |row| row.get(0),
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(count.max(0) as u64)
}
