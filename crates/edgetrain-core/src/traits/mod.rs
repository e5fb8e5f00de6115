mod device_registry;
mod job_store;
mod remote;
mod sample_store;

pub use device_registry::IDeviceRegistry;
pub use job_store::IJobStore;
pub use remote::{IRemoteTrainingClient, ISampleUploader, IVirtualDeviceSource};
pub use sample_store::ISampleStore;

/// Everything the orchestrator needs from persistence.
pub trait IEdgeStorage: ISampleStore + IDeviceRegistry + IJobStore {}

impl<T: ISampleStore + IDeviceRegistry + IJobStore> IEdgeStorage for T {}
