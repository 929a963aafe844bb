//! Task executor shell: the outer boundary the engine invokes each tick.
//!
//! Responsibilities, in order:
//! - resolve the interval pair from system config + task overrides;
//! - open a scoped client session and release it on every exit path
//!   (done, pending, error);
//! - short-circuit re-submission via the persisted `done_job_id`;
//! - delegate submit/poll to the dispatch controller;
//! - turn `NotReady`, `NotStarted`, and transient session-open failures
//!   into a scheduled-retry signal with a state snapshot;
//! - run the result processor on completion and stamp `job.last_job_id`;
//! - translate every internal error into [`TaskExecutionError`].
//!
//! No remote-client error type escapes this module.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{Intervals, SystemConfig};
use crate::dispatch::{JobDispatcher, PollOutcome, Submitter};
use crate::domain::{
    ClientError, DomainKey, ExecuteStatus, JobHandle, RemoteJobId, SessionId, StateError,
    TaskExecutionError, TaskRequest, result,
};
use crate::ports::{EmptyResultProcessor, JobClientFactory, RemoteJobClient, ResultProcessor, StateStore};

use super::registry::ProcessorRegistry;

/// State key recording the job id of a completed dispatch. Later ticks of
/// the same attempt (and restarts after completion) re-attach through this
/// without touching the controller's submission path.
pub const DONE_JOB_ID_KEY: &str = "done_job_id";

/// The retry/error-translation wrapper around the dispatch controller.
pub struct TaskExecutor {
    factory: Arc<dyn JobClientFactory>,
    dispatcher: JobDispatcher,
    processors: ProcessorRegistry,
    fallback: Arc<dyn ResultProcessor>,
    config: SystemConfig,
}

impl TaskExecutor {
    pub fn new(factory: Arc<dyn JobClientFactory>, config: SystemConfig) -> Self {
        Self {
            factory,
            dispatcher: JobDispatcher::with_system_clock(),
            processors: ProcessorRegistry::new(),
            fallback: Arc::new(EmptyResultProcessor),
            config,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: JobDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_processors(mut self, processors: ProcessorRegistry) -> Self {
        self.processors = processors;
        self
    }

    /// One scheduling tick for one task attempt.
    ///
    /// Returns `Pending` while the remote job runs (a control signal, not an
    /// error) and `Done` with the task result once it succeeds. All failures
    /// surface as [`TaskExecutionError`].
    pub async fn execute(
        &self,
        request: &TaskRequest,
        state: &dyn StateStore,
    ) -> Result<ExecuteStatus, TaskExecutionError> {
        let intervals = Intervals::resolve(&self.config, &request.config)?;

        let session = SessionId::generate();
        let client = match self.factory.open(request).await {
            Ok(client) => client,
            Err(err) if err.is_transient() => {
                warn!(task = %request.task_name, error = %err, "transient session-open failure, backing off");
                let snapshot = state.snapshot().await.map_err(TaskExecutionError::from)?;
                return Ok(ExecuteStatus::Pending {
                    wait: intervals.retry,
                    state: snapshot,
                });
            }
            Err(err) => return Err(TaskExecutionError::from(err)),
        };
        debug!(session = %session, task = %request.task_name, "remote session opened");

        // The session must be released on every path out of the body,
        // including the scheduled-retry path.
        let outcome = self.run_session(client.as_ref(), request, state, &intervals).await;
        client.release().await;
        debug!(session = %session, "remote session released");

        outcome
    }

    async fn run_session(
        &self,
        client: &dyn RemoteJobClient,
        request: &TaskRequest,
        state: &dyn StateStore,
        intervals: &Intervals,
    ) -> Result<ExecuteStatus, TaskExecutionError> {
        let handle = match self.done_job_id(state).await? {
            Some(job_id) => {
                debug!(job_id = %job_id, "dispatch already complete, reattaching for result");
                JobHandle::reattached(job_id)
            }
            None => {
                let submitter = ConfigSubmitter {
                    params: &request.config,
                };
                match self
                    .dispatcher
                    .run(state, client, intervals, request, &submitter)
                    .await?
                {
                    PollOutcome::Done(handle) => {
                        // Completion becomes durable before result processing:
                        // a crash past this point never re-enters the poll loop.
                        state
                            .set(DONE_JOB_ID_KEY, Value::String(handle.job_id().as_str().to_owned()))
                            .await
                            .map_err(TaskExecutionError::from)?;
                        handle
                    }
                    PollOutcome::NotReady { handle, wait } => {
                        let snapshot = state.snapshot().await.map_err(TaskExecutionError::from)?;
                        debug!(job_id = %handle.job_id(), wait_secs = wait.as_secs(), "job not finished, scheduling retry tick");
                        return Ok(ExecuteStatus::Pending {
                            wait,
                            state: snapshot,
                        });
                    }
                    PollOutcome::NotStarted { wait } => {
                        let snapshot = state.snapshot().await.map_err(TaskExecutionError::from)?;
                        debug!(wait_secs = wait.as_secs(), "submission deferred, scheduling retry tick");
                        return Ok(ExecuteStatus::Pending {
                            wait,
                            state: snapshot,
                        });
                    }
                }
            }
        };

        let processor = self
            .processors
            .get(&request.kind)
            .unwrap_or(&self.fallback);
        let mut task_result = processor
            .process(client, &handle)
            .await
            .map_err(TaskExecutionError::from)?;

        task_result.set_nested(
            result::JOB_SCOPE,
            result::LAST_JOB_ID,
            Value::String(handle.job_id().as_str().to_owned()),
        );

        info!(
            job_id = %handle.job_id(),
            task = %request.task_name,
            reattached = handle.was_reattached(),
            "task attempt completed"
        );
        Ok(ExecuteStatus::Done(task_result))
    }

    async fn done_job_id(
        &self,
        state: &dyn StateStore,
    ) -> Result<Option<RemoteJobId>, TaskExecutionError> {
        let Some(value) = state.get(DONE_JOB_ID_KEY).await.map_err(TaskExecutionError::from)? else {
            return Ok(None);
        };
        match value {
            Value::String(id) => Ok(Some(RemoteJobId::new(id))),
            other => Err(StateError::Corrupt {
                key: DONE_JOB_ID_KEY.to_string(),
                detail: format!("expected string job id, got {other}"),
            }
            .into()),
        }
    }
}

/// Default submitter: hands the task's config straight to the remote submit
/// call as submission parameters.
struct ConfigSubmitter<'a> {
    params: &'a Value,
}

#[async_trait]
impl Submitter for ConfigSubmitter<'_> {
    async fn submit(
        &self,
        client: &dyn RemoteJobClient,
        domain_key: &DomainKey,
    ) -> Result<RemoteJobId, ClientError> {
        client.submit(domain_key, self.params).await
    }
}
