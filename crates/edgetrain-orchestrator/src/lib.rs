//! # edgetrain-orchestrator
//!
//! Decides when a device's samples warrant a remote training run, drives
//! each run through its lifecycle, and reconciles local bookkeeping with
//! the platform's eventually-consistent view.
//!
//! Everything here is synchronous except [`Poller::run`], which drives
//! [`Poller::poll_once`] on the tokio blocking pool.

pub mod engine;
pub mod ingest;
pub mod locks;
pub mod orchestrator;
pub mod poller;
pub mod threshold;
pub mod transitions;
pub mod uploader;

pub use engine::{EdgeTrainEngine, EngineBuilder};
pub use ingest::{IngestAck, Ingestor, PullReport};
pub use locks::LockTable;
pub use orchestrator::{AdvanceOutcome, JobOrchestrator, TriggerOutcome};
pub use poller::{PollReport, Poller};
pub use threshold::{evaluate, DeviceSnapshot, TriggerDecision};
pub use uploader::{SampleUploadService, UploadReport};
