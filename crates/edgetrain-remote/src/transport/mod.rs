//! HTTP transport: one retrying client plus status classification.

pub mod http_client;
pub mod status;

pub use http_client::{Auth, HttpClient, HttpClientConfig};
pub use status::{classify_send_error, classify_status};
