//! ResultProcessor port - pluggable per-task-kind result handling.
//!
//! A strategy injected per task kind rather than an inheritance override:
//! once the remote job has succeeded, the processor turns it into a
//! structured [`TaskResult`]. Most job kinds need nothing beyond the default
//! empty result; kinds that download or reshape job output implement this.

use async_trait::async_trait;

use crate::domain::{ClientError, JobHandle, TaskResult};

use super::job_client::RemoteJobClient;

/// Turns a succeeded remote job into a task result.
#[async_trait]
pub trait ResultProcessor: Send + Sync {
    /// Called exactly once per attempt, after the job reached `SUCCEEDED`.
    /// The client session is still open, so the processor may fetch the
    /// job's result payload. Store-param bookkeeping (`job.last_job_id`) is
    /// added by the shell afterwards; processors only produce domain output.
    async fn process(
        &self,
        client: &dyn RemoteJobClient,
        job: &JobHandle,
    ) -> Result<TaskResult, ClientError>;
}

/// Default: a side-effect-free empty success.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResultProcessor;

#[async_trait]
impl ResultProcessor for EmptyResultProcessor {
    async fn process(
        &self,
        _client: &dyn RemoteJobClient,
        _job: &JobHandle,
    ) -> Result<TaskResult, ClientError> {
        Ok(TaskResult::empty())
    }
}
