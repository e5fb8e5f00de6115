//! # edgetrain-storage
//!
//! SQLite persistence layer: samples, the device registry, training jobs and
//! their transition history. One serialized write connection, a read pool for
//! file-backed databases, and `PRAGMA user_version` migrations.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use edgetrain_core::errors::{EdgeTrainError, StorageError};

/// Convert any error message into an `EdgeTrainError::StorageError`.
pub fn to_storage_err(message: String) -> EdgeTrainError {
    EdgeTrainError::StorageError(StorageError::SqliteError { message })
}
