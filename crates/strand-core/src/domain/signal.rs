//! Execute status: the tagged control signal returned by the executor shell.
//!
//! "Not yet done" is expected, frequent control flow, so it is a variant of
//! an explicit result type instead of an error. The outer engine's tick loop
//! matches on this to decide between "record the result" and "re-invoke me
//! after `wait`".

use std::time::Duration;

use serde_json::{Map, Value};

use super::result::TaskResult;

/// Snapshot of an attempt's durable state params, carried on the retry
/// signal so the engine persists exactly what the attempt had written.
pub type StateSnapshot = Map<String, Value>;

/// Outcome of one `execute` invocation (one scheduling tick).
#[derive(Debug, Clone, PartialEq)]
pub enum ExecuteStatus {
    /// The attempt finished; the result carries the output store params.
    Done(TaskResult),

    /// The attempt is not finished. Re-invoke after `wait`; persist `state`.
    /// This is a scheduled-retry signal, not a failure.
    Pending {
        wait: Duration,
        state: StateSnapshot,
    },
}

impl ExecuteStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, ExecuteStatus::Done(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ExecuteStatus::Pending { .. })
    }
}
