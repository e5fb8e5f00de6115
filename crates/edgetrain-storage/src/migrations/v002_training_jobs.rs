//! v002: training_jobs with the one-active-job-per-device index.

use rusqlite::Connection;

use edgetrain_core::errors::EdgeTrainResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EdgeTrainResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS training_jobs (
            seq                  INTEGER PRIMARY KEY AUTOINCREMENT,
            id                   TEXT NOT NULL UNIQUE,
            device_id            TEXT NOT NULL REFERENCES devices(device_id),
            reason               TEXT NOT NULL,
            state                TEXT NOT NULL,
            remote_ref           TEXT,
            samples_at_trigger   INTEGER NOT NULL DEFAULT 0,
            accuracy             REAL,
            error                TEXT,
            consecutive_failures INTEGER NOT NULL DEFAULT 0,
            deploy_started_at    TEXT,
            created_at           TEXT NOT NULL,
            last_polled_at       TEXT,
            completed_at         TEXT,
            version              INTEGER NOT NULL DEFAULT 0
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_training_jobs_one_active
            ON training_jobs(device_id)
            WHERE state NOT IN ('deployed', 'failed');
        CREATE INDEX IF NOT EXISTS idx_training_jobs_device ON training_jobs(device_id, seq);
        CREATE INDEX IF NOT EXISTS idx_training_jobs_state ON training_jobs(state);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
