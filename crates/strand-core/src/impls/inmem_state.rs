//! In-memory state store.
//!
//! Durability is the caller's problem here: this store is for tests and the
//! CLI demo, where "durable" means "survives between invocations within one
//! process". Handles clone cheaply (Arc inside), so a test can keep a handle
//! and inspect what the attempt persisted.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{StateError, StateSnapshot};
use crate::ports::StateStore;

#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    params: Arc<Mutex<StateSnapshot>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-existing snapshot (simulates resuming an attempt
    /// whose state survived a process restart).
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            params: Arc::new(Mutex::new(snapshot)),
        }
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StateError> {
        let params = self.params.lock().await;
        Ok(params.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StateError> {
        let mut params = self.params.lock().await;
        params.insert(key.to_string(), value);
        Ok(())
    }

    async fn snapshot(&self) -> Result<StateSnapshot, StateError> {
        let params = self.params.lock().await;
        Ok(params.clone())
    }
}
