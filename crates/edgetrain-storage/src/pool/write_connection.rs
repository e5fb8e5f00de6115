//! Single write connection. Serialized writes, no contention.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use edgetrain_core::config::defaults::DEFAULT_BUSY_TIMEOUT_MS;
use edgetrain_core::errors::{EdgeTrainResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The one connection allowed to write.
///
/// Guarded by a `std::sync::Mutex`: every caller is synchronous, including
/// the poller, which reaches storage from `spawn_blocking` threads.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a new write connection to the given database path.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> EdgeTrainResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> EdgeTrainResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and execute a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> EdgeTrainResult<T>
    where
        F: FnOnce(&Connection) -> EdgeTrainResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            resource: "write connection".into(),
        })?;
        f(&guard)
    }
}
