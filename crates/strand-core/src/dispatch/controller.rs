//! Job dispatch controller: submit once, persist, poll one tick at a time.
//!
//! Core ordering guarantee: the durable write of the job id completes before
//! `run` returns control after a submission. A crash after that write can
//! only ever re-attach; a crash before it re-submits with the same domain
//! key, which the remote side deduplicates. Together that yields at-most-one
//! logical remote job per attempt.
//!
//! The controller never blocks: each call performs at most one submit and
//! one poll, then hands a wait duration back to the caller. Both the
//! poll-again backoff and the transient-error backoff are expressed this
//! way, so one worker process can interleave many outstanding jobs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Intervals;
use crate::domain::{
    ClientError, DispatchError, DispatchState, DomainKey, JobHandle, RemoteJobId, RemoteJobStatus,
    StateError, TaskRequest,
};
use crate::ports::{Clock, RemoteJobClient, StateStore, SystemClock};

/// State key holding the submitted job's id. Written exactly once per
/// attempt; never overwritten with a different id.
pub const JOB_ID_KEY: &str = "job.job_id";

/// State key holding the RFC 3339 submission timestamp (bookkeeping only).
pub const SUBMITTED_AT_KEY: &str = "job.submitted_at";

/// Submission callback: produces a remote job given the idempotency key.
/// Task kinds implement this to shape their submission (query text, engine
/// options, ...); the controller owns everything around it.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        client: &dyn RemoteJobClient,
        domain_key: &DomainKey,
    ) -> Result<RemoteJobId, ClientError>;
}

/// Outcome of one controller invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached `SUCCEEDED`; the handle is ready for result extraction.
    Done(JobHandle),

    /// The job is not terminal yet (still running, or a transient remote
    /// error). Re-invoke after `wait`.
    NotReady { handle: JobHandle, wait: Duration },

    /// Submission itself failed transiently, so no job exists yet.
    /// Re-invoke after `wait`; the next invocation submits again with the
    /// same domain key.
    NotStarted { wait: Duration },
}

/// Orchestrates submit-once + single-tick polling over the two ports.
pub struct JobDispatcher {
    clock: Arc<dyn Clock>,
}

impl JobDispatcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// One dispatch tick for one task attempt.
    ///
    /// 1. A job id in durable state means an earlier invocation already
    ///    submitted: re-attach, skip submission entirely.
    /// 2. Otherwise derive the domain key from the request, submit, and
    ///    persist the id *before* doing anything else. A transient submit
    ///    failure waits the retry interval and submits again next tick.
    /// 3. Poll once. `Running` waits the poll interval, a transient client
    ///    error waits the retry interval, `Failed` propagates the remote
    ///    detail, `Succeeded` is done.
    pub async fn run(
        &self,
        state: &dyn StateStore,
        client: &dyn RemoteJobClient,
        intervals: &Intervals,
        request: &TaskRequest,
        submitter: &dyn Submitter,
    ) -> Result<PollOutcome, DispatchError> {
        let handle = match self.recorded_job_id(state).await? {
            Some(job_id) => {
                debug!(
                    job_id = %job_id,
                    dispatch_state = ?DispatchState::derive(true, None),
                    "reattaching to previously submitted job"
                );
                JobHandle::reattached(job_id)
            }
            None => match self.submit_and_persist(state, client, request, submitter).await {
                Ok(handle) => handle,
                Err(DispatchError::Client(err)) if err.is_transient() => {
                    warn!(task = %request.task_name, error = %err, "transient submit failure, backing off");
                    return Ok(PollOutcome::NotStarted {
                        wait: intervals.retry,
                    });
                }
                Err(err) => return Err(err),
            },
        };

        self.poll_once(client, intervals, handle).await
    }

    async fn recorded_job_id(
        &self,
        state: &dyn StateStore,
    ) -> Result<Option<RemoteJobId>, StateError> {
        let Some(value) = state.get(JOB_ID_KEY).await? else {
            return Ok(None);
        };
        match value {
            Value::String(id) => Ok(Some(RemoteJobId::new(id))),
            other => Err(StateError::Corrupt {
                key: JOB_ID_KEY.to_string(),
                detail: format!("expected string job id, got {other}"),
            }),
        }
    }

    async fn submit_and_persist(
        &self,
        state: &dyn StateStore,
        client: &dyn RemoteJobClient,
        request: &TaskRequest,
        submitter: &dyn Submitter,
    ) -> Result<JobHandle, DispatchError> {
        let domain_key = request.domain_key();
        debug!(domain_key = %domain_key, task = %request.task_name, "submitting remote job");

        let job_id = submitter.submit(client, &domain_key).await?;

        // The id must be durable before control leaves this invocation;
        // everything after this write is re-attach territory.
        state
            .set(JOB_ID_KEY, Value::String(job_id.as_str().to_owned()))
            .await?;
        state
            .set(
                SUBMITTED_AT_KEY,
                Value::String(self.clock.now().to_rfc3339()),
            )
            .await?;

        info!(job_id = %job_id, domain_key = %domain_key, "remote job submitted and recorded");
        Ok(JobHandle::submitted(job_id))
    }

    async fn poll_once(
        &self,
        client: &dyn RemoteJobClient,
        intervals: &Intervals,
        handle: JobHandle,
    ) -> Result<PollOutcome, DispatchError> {
        let report = match client.poll(handle.job_id()).await {
            Ok(report) => report,
            Err(err) if err.is_transient() => {
                warn!(job_id = %handle.job_id(), error = %err, "transient poll failure, backing off");
                return Ok(PollOutcome::NotReady {
                    handle,
                    wait: intervals.retry,
                });
            }
            Err(err) => return Err(DispatchError::Client(err)),
        };

        debug!(
            job_id = %handle.job_id(),
            dispatch_state = ?DispatchState::derive(true, Some(report.status)),
            "poll observation"
        );

        match report.status {
            RemoteJobStatus::Running => Ok(PollOutcome::NotReady {
                handle,
                wait: intervals.poll,
            }),
            RemoteJobStatus::Succeeded => Ok(PollOutcome::Done(handle)),
            RemoteJobStatus::Failed => Err(DispatchError::JobFailed {
                detail: report
                    .detail
                    .unwrap_or_else(|| "remote job reported failure without detail".to_string()),
                job_id: handle.into_job_id(),
            }),
        }
    }
}
