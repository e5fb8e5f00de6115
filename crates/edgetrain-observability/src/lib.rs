//! # edgetrain-observability
//!
//! Structured tracing setup, one log event per domain occurrence, and the
//! counters the orchestrator and poller update as they work.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::{MetricsSnapshot, OrchestratorMetrics};
pub use tracing_setup::{init_tracing, init_tracing_from_config, init_tracing_with_filter};
