//! Domain key: the idempotency token for remote submission.
//!
//! The durable job-id record prevents re-submission after the persist, but a
//! crash can still land between `submit` and the durable write. The domain
//! key closes that window: it is derived deterministically from attempt
//! identity, so a re-submission after such a crash carries the same key and
//! the remote side can deduplicate it. The key is the real at-most-once
//! guard; local state is only the fast path.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ids::AttemptId;

/// Deterministic, reproducible idempotency token for one task attempt.
///
/// Derivation: lowercase hex SHA-256 over
/// `workflow NUL task_name NUL attempt_ulid`, truncated to 32 hex chars
/// (128 bits). All three inputs are engine-assigned and stable across
/// retries and restarts, so the key is stable too. NUL separators keep
/// `("a", "bc")` and `("ab", "c")` from colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainKey(String);

impl DomainKey {
    pub fn derive(workflow: &str, task_name: &str, attempt_id: AttemptId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(workflow.as_bytes());
        hasher.update([0u8]);
        hasher.update(task_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(attempt_id.as_ulid().to_string().as_bytes());

        let mut hexed = hex::encode(hasher.finalize());
        hexed.truncate(32);
        Self(hexed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
