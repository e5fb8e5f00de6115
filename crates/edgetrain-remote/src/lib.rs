//! # edgetrain-remote
//!
//! Blocking HTTP clients for the external collaborators:
//! the training platform (start, status, deploy, sample upload) and the
//! virtual-device data source. Every failure is reported as a
//! [`RemoteError`](edgetrain_core::RemoteError) already classified into
//! transient or fatal.

pub mod protocol;
pub mod training_client;
pub mod transport;
pub mod virtual_device;

pub use training_client::HttpTrainingClient;
pub use transport::{HttpClient, HttpClientConfig};
pub use virtual_device::VirtualDeviceClient;
