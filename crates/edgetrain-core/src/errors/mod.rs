mod edgetrain_error;
mod remote_error;
mod storage_error;

pub use edgetrain_error::{EdgeTrainError, EdgeTrainResult};
pub use remote_error::RemoteError;
pub use storage_error::StorageError;
