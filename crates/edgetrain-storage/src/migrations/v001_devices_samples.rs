//! v001: devices, samples.

use rusqlite::Connection;

use edgetrain_core::errors::EdgeTrainResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EdgeTrainResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS devices (
            device_id       TEXT PRIMARY KEY,
            sample_count    INTEGER NOT NULL DEFAULT 0 CHECK (sample_count >= 0),
            last_trained_at TEXT,
            status          TEXT NOT NULL DEFAULT 'idle',
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS samples (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id        TEXT NOT NULL REFERENCES devices(device_id),
            sensor_type      TEXT NOT NULL,
            sample_rate      REAL NOT NULL,
            payload          TEXT NOT NULL,
            label            TEXT,
            uploaded         INTEGER NOT NULL DEFAULT 0,
            remote_sample_id TEXT,
            created_at       TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_samples_device ON samples(device_id);
        CREATE INDEX IF NOT EXISTS idx_samples_pending ON samples(uploaded, id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
