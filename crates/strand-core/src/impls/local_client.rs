//! Local job service: an in-process fake of the remote job API.
//!
//! Behaves like the real collaborator in the ways the dispatch core depends
//! on: jobs run for a configurable number of polls before succeeding, a
//! duplicate domain key returns the existing job instead of creating a
//! second one, and transient poll failures can be injected. The service
//! outlives client sessions (as a remote service would); sessions are opened
//! through [`LocalJobClientFactory`] and counted so tests can assert the
//! release-on-every-path discipline.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::{ClientError, DomainKey, JobStatusReport, RemoteJobId, TaskRequest};
use crate::ports::{JobClientFactory, RemoteJobClient};

struct SimulatedJob {
    polls_remaining: u32,
    result: Value,
}

struct ServiceState {
    jobs: HashMap<RemoteJobId, SimulatedJob>,
    by_domain_key: HashMap<DomainKey, RemoteJobId>,
    next_job: u64,
    submit_calls: u32,
    pending_transient_failures: u32,
    open_sessions: u32,
}

/// The simulated remote side.
pub struct LocalJobService {
    state: Mutex<ServiceState>,
    polls_until_done: u32,
    result: Value,
}

impl LocalJobService {
    /// `polls_until_done`: how many `RUNNING` observations a job reports
    /// before turning `SUCCEEDED`.
    pub fn new(polls_until_done: u32) -> Self {
        Self {
            state: Mutex::new(ServiceState {
                jobs: HashMap::new(),
                by_domain_key: HashMap::new(),
                next_job: 1,
                submit_calls: 0,
                pending_transient_failures: 0,
                open_sessions: 0,
            }),
            polls_until_done,
            result: Value::Null,
        }
    }

    /// Fixed result payload every job completes with.
    pub fn with_result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    /// Make the next `n` polls fail with a transient error.
    pub async fn fail_next_polls(&self, n: u32) {
        self.state.lock().await.pending_transient_failures = n;
    }

    /// Total `submit` calls observed (including deduplicated ones).
    pub async fn submit_calls(&self) -> u32 {
        self.state.lock().await.submit_calls
    }

    /// Number of distinct jobs actually created.
    pub async fn jobs_created(&self) -> usize {
        self.state.lock().await.jobs.len()
    }

    /// Currently open client sessions (0 when release discipline holds).
    pub async fn open_sessions(&self) -> u32 {
        self.state.lock().await.open_sessions
    }

    async fn submit(&self, domain_key: &DomainKey, _params: &Value) -> RemoteJobId {
        let mut state = self.state.lock().await;
        state.submit_calls += 1;

        // 同じ domain key の再投入は既存ジョブを返す（リモート側の冪等性）
        if let Some(existing) = state.by_domain_key.get(domain_key) {
            return existing.clone();
        }

        let job_id = RemoteJobId::new(format!("local-{}", state.next_job));
        state.next_job += 1;
        state.jobs.insert(
            job_id.clone(),
            SimulatedJob {
                polls_remaining: self.polls_until_done,
                result: self.result.clone(),
            },
        );
        state.by_domain_key.insert(domain_key.clone(), job_id.clone());
        job_id
    }

    async fn poll(&self, job_id: &RemoteJobId) -> Result<JobStatusReport, ClientError> {
        let mut state = self.state.lock().await;

        if state.pending_transient_failures > 0 {
            state.pending_transient_failures -= 1;
            return Err(ClientError::transient("service temporarily unavailable")
                .for_job(job_id.clone()));
        }

        let Some(job) = state.jobs.get_mut(job_id) else {
            return Err(ClientError::terminal(format!("unknown job {job_id}"))
                .for_job(job_id.clone()));
        };

        if job.polls_remaining > 0 {
            job.polls_remaining -= 1;
            Ok(JobStatusReport::running())
        } else {
            Ok(JobStatusReport::succeeded())
        }
    }

    async fn fetch_result(&self, job_id: &RemoteJobId) -> Result<Value, ClientError> {
        let state = self.state.lock().await;
        state
            .jobs
            .get(job_id)
            .map(|job| job.result.clone())
            .ok_or_else(|| {
                ClientError::terminal(format!("unknown job {job_id}")).for_job(job_id.clone())
            })
    }
}

/// One client session against a [`LocalJobService`].
pub struct LocalJobClient {
    service: Arc<LocalJobService>,
}

#[async_trait]
impl RemoteJobClient for LocalJobClient {
    async fn submit(
        &self,
        domain_key: &DomainKey,
        params: &Value,
    ) -> Result<RemoteJobId, ClientError> {
        Ok(self.service.submit(domain_key, params).await)
    }

    async fn poll(&self, job_id: &RemoteJobId) -> Result<JobStatusReport, ClientError> {
        self.service.poll(job_id).await
    }

    async fn fetch_result(&self, job_id: &RemoteJobId) -> Result<Value, ClientError> {
        self.service.fetch_result(job_id).await
    }

    async fn release(self: Box<Self>) {
        let mut state = self.service.state.lock().await;
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

/// Opens [`LocalJobClient`] sessions.
pub struct LocalJobClientFactory {
    service: Arc<LocalJobService>,
}

impl LocalJobClientFactory {
    pub fn new(service: Arc<LocalJobService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl JobClientFactory for LocalJobClientFactory {
    async fn open(&self, _request: &TaskRequest) -> Result<Box<dyn RemoteJobClient>, ClientError> {
        let mut state = self.service.state.lock().await;
        state.open_sessions += 1;
        drop(state);
        Ok(Box::new(LocalJobClient {
            service: Arc::clone(&self.service),
        }))
    }
}
