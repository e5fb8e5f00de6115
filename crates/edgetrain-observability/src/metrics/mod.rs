//! Counters for the orchestrator, poller, and upload path.

mod orchestrator_metrics;

pub use orchestrator_metrics::{MetricsSnapshot, OrchestratorMetrics};
