//! Shared test support for the edgetrain workspace: JSON fixtures, sample
//! builders, and scripted doubles for every external collaborator.

mod mock_remote;
mod mock_sources;

pub use mock_remote::MockRemote;
pub use mock_sources::{MockUploader, MockVirtualDevice};

use std::path::PathBuf;

use edgetrain_core::models::NewSample;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root directory of the bundled fixture files.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

#[derive(Deserialize)]
struct SampleFixture {
    sensor_type: String,
    sample_rate: f64,
    label: Option<String>,
    payload: serde_json::Value,
}

/// A sample for `device_id` built from `fixtures/samples/{name}.json`.
pub fn sample_from_fixture(device_id: &str, name: &str) -> NewSample {
    let fixture: SampleFixture = load_fixture(&format!("samples/{name}.json"));
    NewSample {
        device_id: device_id.to_string(),
        sensor_type: fixture.sensor_type,
        sample_rate: fixture.sample_rate,
        payload: fixture.payload,
        label: fixture.label,
    }
}

/// The default accelerometer sample for `device_id`.
pub fn new_sample(device_id: &str) -> NewSample {
    sample_from_fixture(device_id, "accelerometer")
}
