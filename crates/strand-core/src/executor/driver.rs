//! Tick driver: a minimal outer-engine stand-in.
//!
//! The real scheduling engine owns re-invocation; this driver reproduces
//! its tick loop for the CLI and integration tests: execute, and on a
//! `Pending` signal sleep the requested wait and execute again. Shutdown is
//! cooperative: it stops ticking but does not abort the remote job, and the
//! shell's release discipline already ran inside `execute`.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domain::{ExecuteStatus, TaskExecutionError, TaskRequest, TaskResult};
use crate::ports::StateStore;

use super::shell::TaskExecutor;

pub struct TickDriver {
    executor: Arc<TaskExecutor>,
}

impl TickDriver {
    pub fn new(executor: Arc<TaskExecutor>) -> Self {
        Self { executor }
    }

    /// Tick until the attempt finishes or shutdown is requested.
    /// Returns `None` when shut down mid-attempt.
    pub async fn drive(
        &self,
        request: &TaskRequest,
        state: &dyn StateStore,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<Option<TaskResult>, TaskExecutionError> {
        loop {
            if *shutdown_rx.borrow() {
                return Ok(None);
            }

            match self.executor.execute(request, state).await? {
                ExecuteStatus::Done(result) => return Ok(Some(result)),
                ExecuteStatus::Pending { wait, .. } => {
                    debug!(task = %request.task_name, wait_secs = wait.as_secs(), "tick: pending");
                    // sleep は shutdown と競合させる（待機中に止められるように）
                    tokio::select! {
                        _ = shutdown_rx.changed() => continue,
                        _ = tokio::time::sleep(wait) => {}
                    }
                }
            }
        }
    }

    /// Convenience for callers without a shutdown channel.
    pub async fn drive_to_completion(
        &self,
        request: &TaskRequest,
        state: &dyn StateStore,
    ) -> Result<TaskResult, TaskExecutionError> {
        let (_shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let result = self.drive(request, state, &mut shutdown_rx).await?;
        Ok(result.expect("no shutdown signal exists on this channel"))
    }
}
