//! v003: job_transitions (append-only history).

use rusqlite::Connection;

use edgetrain_core::errors::EdgeTrainResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EdgeTrainResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS job_transitions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id      TEXT NOT NULL REFERENCES training_jobs(id),
            from_state  TEXT,
            to_state    TEXT NOT NULL,
            detail      TEXT,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_job_transitions_job ON job_transitions(job_id, id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
