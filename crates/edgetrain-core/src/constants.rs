/// edgetrain version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum length of a device identifier.
pub const MAX_DEVICE_ID_LEN: usize = 128;

/// Maximum length of a sensor type name.
pub const MAX_SENSOR_TYPE_LEN: usize = 64;

/// Maximum number of samples pushed per upload batch.
pub const MAX_UPLOAD_BATCH_SIZE: usize = 500;

/// Component name used in structured log events.
pub const COMPONENT_ORCHESTRATOR: &str = "orchestrator";
pub const COMPONENT_POLLER: &str = "poller";
pub const COMPONENT_UPLOADER: &str = "uploader";
