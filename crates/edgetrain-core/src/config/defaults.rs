// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "edgetrain.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Training ---
pub const DEFAULT_TRAINING_THRESHOLD: u64 = 100;
pub const DEFAULT_AUTO_TRIGGER: bool = true;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
// Three transient failures are tolerated; the fourth fails the job.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 4;
pub const DEFAULT_UPLOAD_BATCH_SIZE: usize = 50;

// --- Remote platform ---
pub const DEFAULT_API_BASE_URL: &str = "https://studio.edgeimpulse.com/v1";
pub const DEFAULT_INGESTION_URL: &str = "https://ingestion.edgeimpulse.com";
pub const DEFAULT_DEPLOY_TARGET: &str = "zip";
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STATUS_RETRIES: u32 = 2;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

// --- Virtual device ---
pub const DEFAULT_VIRTUAL_DEVICE_TIMEOUT_SECS: u64 = 10;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;

// --- Environment overrides ---
pub const ENV_API_KEY: &str = "EDGETRAIN_API_KEY";
pub const ENV_VIRTUAL_DEVICE_API_KEY: &str = "EDGETRAIN_VIRTUAL_DEVICE_API_KEY";
pub const ENV_DB_PATH: &str = "EDGETRAIN_DB_PATH";
