//! Device registry rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use edgetrain_core::errors::{EdgeTrainError, EdgeTrainResult};
use edgetrain_core::models::{Device, DeviceStatus};

use super::{parse_enum, parse_opt_ts, parse_ts};
use crate::to_storage_err;

const TABLE: &str = "devices";

const DEVICE_COLUMNS: &str =
    "device_id, sample_count, last_trained_at, status, created_at, updated_at";

struct DeviceRow {
    device_id: String,
    sample_count: i64,
    last_trained_at: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DeviceRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            device_id: row.get(0)?,
            sample_count: row.get(1)?,
            last_trained_at: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_device(self) -> EdgeTrainResult<Device> {
        Ok(Device {
            device_id: self.device_id,
            sample_count: self.sample_count.max(0) as u64,
            last_trained_at: parse_opt_ts(TABLE, self.last_trained_at)?,
            status: parse_enum::<DeviceStatus>(TABLE, &self.status)?,
            created_at: parse_ts(TABLE, &self.created_at)?,
            updated_at: parse_ts(TABLE, &self.updated_at)?,
        })
    }
}

/// Insert an `idle` device row unless one exists. Returns whether it was new.
pub fn ensure_device(conn: &Connection, device_id: &str, now: DateTime<Utc>) -> EdgeTrainResult<bool> {
    let ts = now.to_rfc3339();
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO devices (device_id, sample_count, status, created_at, updated_at)
             VALUES (?1, 0, ?2, ?3, ?3)",
            params![device_id, DeviceStatus::Idle.as_str(), ts],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(inserted > 0)
}

pub fn get_device(conn: &Connection, device_id: &str) -> EdgeTrainResult<Option<Device>> {
    let row = conn
        .query_row(
            &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE device_id = ?1"),
            params![device_id],
            DeviceRow::from_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(DeviceRow::into_device).transpose()
}

pub fn require_device(conn: &Connection, device_id: &str) -> EdgeTrainResult<Device> {
    get_device(conn, device_id)?.ok_or_else(|| EdgeTrainError::DeviceNotFound {
        id: device_id.to_string(),
    })
}

pub fn list_devices(conn: &Connection) -> EdgeTrainResult<Vec<Device>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {DEVICE_COLUMNS} FROM devices ORDER BY device_id"))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], DeviceRow::from_row)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut devices = Vec::new();
    for row in rows {
        let row = row.map_err(|e| to_storage_err(e.to_string()))?;
        devices.push(row.into_device()?);
    }
    Ok(devices)
}

pub fn set_status(
    conn: &Connection,
    device_id: &str,
    status: DeviceStatus,
    now: DateTime<Utc>,
) -> EdgeTrainResult<()> {
    let updated = conn
        .execute(
            "UPDATE devices SET status = ?2, updated_at = ?3 WHERE device_id = ?1",
            params![device_id, status.as_str(), now.to_rfc3339()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(EdgeTrainError::DeviceNotFound {
            id: device_id.to_string(),
        });
    }
    Ok(())
}

/// Atomically bump the sample count and return the new value.
pub fn increment_sample_count(
    conn: &Connection,
    device_id: &str,
    now: DateTime<Utc>,
) -> EdgeTrainResult<u64> {
    let count: i64 = conn
        .query_row(
            "UPDATE devices SET sample_count = sample_count + 1, updated_at = ?2
             WHERE device_id = ?1
             RETURNING sample_count",
            params![device_id, now.to_rfc3339()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?
        .ok_or_else(|| EdgeTrainError::DeviceNotFound {
            id: device_id.to_string(),
        })?;
    Ok(count.max(0) as u64)
}

/// Zero the count, stamp `last_trained_at`, mark `ready`. Only ever called in
/// the same transaction that moves a job to `deployed`.
pub fn reset_after_deploy(
    conn: &Connection,
    device_id: &str,
    trained_at: DateTime<Utc>,
) -> EdgeTrainResult<()> {
    let ts = trained_at.to_rfc3339();
    let updated = conn
        .execute(
            "UPDATE devices
             SET sample_count = 0, last_trained_at = ?2, status = ?3, updated_at = ?2
             WHERE device_id = ?1",
            params![device_id, ts, DeviceStatus::Ready.as_str()],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    if updated == 0 {
        return Err(EdgeTrainError::DeviceNotFound {
            id: device_id.to_string(),
        });
    }
    Ok(())
}
