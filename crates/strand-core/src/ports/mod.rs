//! Ports - the abstraction layer.
//!
//! Each trait here is a seam to an external collaborator (durable state
//! store, remote job service, wall clock) so the dispatch core stays
//! implementation-agnostic and testable. The in-memory implementations live
//! in `crate::impls`.

pub mod clock;
pub mod job_client;
pub mod result_processor;
pub mod state_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::job_client::{JobClientFactory, RemoteJobClient};
pub use self::result_processor::{EmptyResultProcessor, ResultProcessor};
pub use self::state_store::StateStore;
