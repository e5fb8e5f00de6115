//! # edgetrain-core
//!
//! Foundation crate for the edgetrain training bridge.
//! Defines the data model, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::EdgeTrainConfig;
pub use errors::{EdgeTrainError, EdgeTrainResult, RemoteError, StorageError};
pub use models::{
    Device, DeviceStatus, DeviceStats, JobState, NewSample, Sample, TrainingJob, TriggerReason,
};
