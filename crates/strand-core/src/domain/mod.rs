//! Domain model (IDs, domain key, job handle, status, result, control signal, errors).

pub mod errors;
pub mod ids;
pub mod job;
pub mod key;
pub mod request;
pub mod result;
pub mod signal;
pub mod status;

pub use errors::{ClientError, ConfigError, DispatchError, ErrorKind, StateError, TaskExecutionError};
pub use ids::{AttemptId, SessionId};
pub use job::{JobHandle, RemoteJobId};
pub use key::DomainKey;
pub use request::{TaskKind, TaskRequest};
pub use result::TaskResult;
pub use signal::{ExecuteStatus, StateSnapshot};
pub use status::{DispatchState, JobStatusReport, RemoteJobStatus};
