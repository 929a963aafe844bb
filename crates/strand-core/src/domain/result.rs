//! Task result: success marker plus output store parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Store-param scope the shell writes the job bookkeeping under.
pub const JOB_SCOPE: &str = "job";

/// Key holding the id of the job this attempt resolved to.
pub const LAST_JOB_ID: &str = "last_job_id";

/// Output record of one completed task attempt.
///
/// Success itself is side-effect-free; the payload is `store_params`, a
/// nested map handed to downstream tasks. The shell always stamps
/// `job.last_job_id` into it so downstream tasks can reference the job that
/// produced their inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    store_params: Map<String, Value>,
}

impl TaskResult {
    /// An empty result: success, nothing to store (yet).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style top-level store param.
    pub fn with_store_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.store_params.insert(key.into(), value);
        self
    }

    /// Set `scope.key = value`, creating the nested scope map if needed.
    /// If `scope` exists but is not an object it is replaced; store params
    /// are append-only from the task's point of view, so that only happens
    /// on a processor writing a scalar where the shell owns a scope.
    pub fn set_nested(&mut self, scope: &str, key: impl Into<String>, value: Value) {
        let entry = self
            .store_params
            .entry(scope.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        entry
            .as_object_mut()
            .expect("scope entry was just made an object")
            .insert(key.into(), value);
    }

    pub fn store_params(&self) -> &Map<String, Value> {
        &self.store_params
    }

    /// Convenience accessor for `job.last_job_id`.
    pub fn last_job_id(&self) -> Option<&str> {
        self.store_params
            .get(JOB_SCOPE)?
            .get(LAST_JOB_ID)?
            .as_str()
    }
}
