//! Read-only connections for the API-facing queries (`get_job`,
//! `list_jobs`, device stats) so they never queue behind ingestion writes.
//!
//! Only used for file-backed databases. In WAL mode a reader sees the last
//! committed snapshot, so a job read here may lag a concurrent commit; the
//! version check in `commit_transition` turns that into a stale commit.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use edgetrain_core::errors::{EdgeTrainResult, StorageError};

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

/// Upper bound on `storage.read_pool_size`.
const MAX_READERS: usize = 8;

pub struct ReadPool {
    readers: Vec<Mutex<Connection>>,
    cursor: AtomicUsize,
}

impl ReadPool {
    /// `reader_count` is clamped to `1..=8`.
    pub fn open(path: &Path, reader_count: usize, busy_timeout_ms: u32) -> EdgeTrainResult<Self> {
        let readers = (0..reader_count.clamp(1, MAX_READERS))
            .map(|_| open_reader(path, busy_timeout_ms).map(Mutex::new))
            .collect::<EdgeTrainResult<Vec<_>>>()?;
        Ok(Self {
            readers,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Run `f` on the next reader in rotation. Waits if that reader is busy.
    pub fn with_conn<F, T>(&self, f: F) -> EdgeTrainResult<T>
    where
        F: FnOnce(&Connection) -> EdgeTrainResult<T>,
    {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let reader = self.readers[slot]
            .lock()
            .map_err(|_| StorageError::LockPoisoned {
                resource: format!("edgetrain reader #{slot}"),
            })?;
        f(&reader)
    }

    pub fn size(&self) -> usize {
        self.readers.len()
    }
}

fn open_reader(path: &Path, busy_timeout_ms: u32) -> EdgeTrainResult<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| to_storage_err(format!("open reader {}: {e}", path.display())))?;
    apply_read_pragmas(&conn, busy_timeout_ms)?;
    Ok(conn)
}
