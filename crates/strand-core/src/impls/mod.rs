//! In-memory implementations of the ports, for development and tests.

pub mod inmem_state;
pub mod local_client;

pub use inmem_state::InMemoryStateStore;
pub use local_client::{LocalJobClientFactory, LocalJobService};
