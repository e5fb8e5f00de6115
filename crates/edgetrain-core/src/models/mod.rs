mod device;
mod job;
mod remote;
mod sample;
mod transition;

pub use device::{validate_device_id, Device, DeviceStats, DeviceStatus};
pub use job::{JobState, TrainingJob, TriggerReason};
pub use remote::{DeployOutcome, RemoteJobRef, RemoteJobStatus};
pub use sample::{NewSample, RecordedSample, Sample};
pub use transition::{DeviceEffect, JobCommit, JobTransitionRecord};
