//! Registry of result processors (task kind -> processor).
//!
//! Built during initialization (mutable), used during execution (immutable).
//! This avoids locks and keeps lookups cheap.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::TaskKind;
use crate::ports::ResultProcessor;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate result processor for task kind '{0}'")]
    Duplicate(TaskKind),
}

/// Maps task kinds to their result processors.
///
/// Kinds without an entry fall back to the empty processor in the shell;
/// registration is only needed for kinds that shape their job output.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<TaskKind, Arc<dyn ResultProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Register a processor for a task kind. Duplicate registration is a
    /// wiring bug, so it errors rather than silently overwriting.
    pub fn register(
        &mut self,
        kind: TaskKind,
        processor: Arc<dyn ResultProcessor>,
    ) -> Result<(), RegistryError> {
        if self.processors.contains_key(&kind) {
            return Err(RegistryError::Duplicate(kind));
        }
        self.processors.insert(kind, processor);
        Ok(())
    }

    pub fn get(&self, kind: &TaskKind) -> Option<&Arc<dyn ResultProcessor>> {
        self.processors.get(kind)
    }
}
