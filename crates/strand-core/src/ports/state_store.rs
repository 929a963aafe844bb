//! StateStore port - durable per-attempt key-value state.
//!
//! The store is the only persistent record that a remote job was submitted.
//! It is scoped to one task attempt and never contended by other attempts,
//! so implementations need durability, not cross-attempt locking.
//!
//! Contract:
//! - writes are crash-durable before `set` returns;
//! - `get` after restart observes every completed `set`;
//! - keys are flat strings (callers namespace with dotted keys).

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{StateError, StateSnapshot};

/// Durable key-value state for one task attempt.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read one value. `None` means never written.
    async fn get(&self, key: &str) -> Result<Option<Value>, StateError>;

    /// Durably write one value. Must not return before the write is durable;
    /// the submit-once guarantee rests on this ordering.
    async fn set(&self, key: &str, value: Value) -> Result<(), StateError>;

    /// Snapshot of all params, carried on the scheduled-retry signal.
    async fn snapshot(&self) -> Result<StateSnapshot, StateError>;
}
