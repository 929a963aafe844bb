//! Executor module: the task executor shell, processor registry, and the
//! tick driver used by tests and the CLI to stand in for the outer engine.

mod driver;
mod registry;
mod shell;

pub use driver::TickDriver;
pub use registry::{ProcessorRegistry, RegistryError};
pub use shell::{DONE_JOB_ID_KEY, TaskExecutor};
