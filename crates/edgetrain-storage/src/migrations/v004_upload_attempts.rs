//! v004: per-sample upload attempt tracking.

use rusqlite::Connection;

use edgetrain_core::errors::EdgeTrainResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> EdgeTrainResult<()> {
    conn.execute_batch(
        "
        ALTER TABLE samples ADD COLUMN upload_attempts INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE samples ADD COLUMN last_upload_error TEXT;

        DROP INDEX IF EXISTS idx_samples_pending;
        CREATE INDEX IF NOT EXISTS idx_samples_upload_queue
            ON samples(uploaded, upload_attempts, id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
