//! Schema migrations using PRAGMA user_version.

pub mod v001_devices_samples;
pub mod v002_training_jobs;
pub mod v003_job_transitions;
pub mod v004_upload_attempts;

use rusqlite::Connection;

use edgetrain_core::errors::{EdgeTrainResult, StorageError};

/// Latest schema version. A fresh database ends up here.
pub const LATEST_VERSION: u32 = 4;

type MigrationFn = fn(&Connection) -> EdgeTrainResult<()>;

const MIGRATIONS: &[(u32, MigrationFn)] = &[
    (1, v001_devices_samples::migrate),
    (2, v002_training_jobs::migrate),
    (3, v003_job_transitions::migrate),
    (4, v004_upload_attempts::migrate),
];

/// Run all pending migrations. Each one commits together with its
/// `user_version` bump, so a crash never leaves a half-applied version.
pub fn run_migrations(conn: &Connection) -> EdgeTrainResult<u32> {
    let current = current_version(conn)?;

    for (version, migrate) in MIGRATIONS {
        if current >= *version {
            continue;
        }
        let failed = |reason: String| StorageError::MigrationFailed {
            version: *version,
            reason,
        };
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| failed(e.to_string()))?;
        migrate(&tx).map_err(|e| failed(e.to_string()))?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| failed(e.to_string()))?;
        tx.commit().map_err(|e| failed(e.to_string()))?;
        tracing::info!(version = version, "applied migration");
    }

    current_version(conn)
}

/// Get the current schema version.
pub fn current_version(conn: &Connection) -> EdgeTrainResult<u32> {
    let version = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| StorageError::SqliteError {
            message: e.to_string(),
        })?;
    Ok(version)
}
