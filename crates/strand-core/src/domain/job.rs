//! Remote job identity and the re-attachable job handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier returned by the remote service on submission.
///
/// The format is owned by the remote side; we only store, compare, and echo it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteJobId(String);

impl RemoteJobId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A handle to a remote job owned by the current task attempt.
///
/// Constructed on exactly two paths:
/// - [`JobHandle::submitted`]: the job was submitted during this invocation
///   and its id has been persisted;
/// - [`JobHandle::reattached`]: the id was read back from durable state
///   (covers crash-after-submit and restart-after-complete).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    job_id: RemoteJobId,
    reattached: bool,
}

impl JobHandle {
    pub fn submitted(job_id: RemoteJobId) -> Self {
        Self {
            job_id,
            reattached: false,
        }
    }

    pub fn reattached(job_id: RemoteJobId) -> Self {
        Self {
            job_id,
            reattached: true,
        }
    }

    pub fn job_id(&self) -> &RemoteJobId {
        &self.job_id
    }

    pub fn into_job_id(self) -> RemoteJobId {
        self.job_id
    }

    /// True if this handle was rebuilt from durable state rather than a
    /// fresh submission.
    pub fn was_reattached(&self) -> bool {
        self.reattached
    }
}
