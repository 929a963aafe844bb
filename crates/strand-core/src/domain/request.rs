//! Task request: the engine-supplied identity and configuration of one attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AttemptId;
use super::key::DomainKey;

/// The kind of a task (selects the result processor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskKind(String);

impl TaskKind {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything the outer engine hands the executor for one scheduling tick.
///
/// The same request (same `attempt_id`) is delivered on every tick of one
/// logical attempt; only durable state distinguishes "first invocation" from
/// "polling tick".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Workflow this task belongs to.
    pub workflow: String,

    /// Task name, unique within the workflow.
    pub task_name: String,

    /// Kind of the task (result-processor selection).
    pub kind: TaskKind,

    /// Attempt identity, stable across restarts and ticks.
    pub attempt_id: AttemptId,

    /// Merged task configuration. Submission parameters and optional
    /// interval overrides live here; we keep it open-ended JSON so task
    /// kinds can evolve without core changes.
    #[serde(default)]
    pub config: serde_json::Value,
}

impl TaskRequest {
    pub fn new(
        workflow: impl Into<String>,
        task_name: impl Into<String>,
        kind: TaskKind,
        attempt_id: AttemptId,
        config: serde_json::Value,
    ) -> Self {
        Self {
            workflow: workflow.into(),
            task_name: task_name.into(),
            kind,
            attempt_id,
            config,
        }
    }

    /// The idempotency token for this attempt's remote submission.
    pub fn domain_key(&self) -> DomainKey {
        DomainKey::derive(&self.workflow, &self.task_name, self.attempt_id)
    }
}
