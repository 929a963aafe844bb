//! RemoteJobClient port - the remote job-submission API.
//!
//! The client owns error classification: it alone decides whether a failure
//! is transient (retry later) or terminal (propagate). The dispatch
//! controller acts on that classification without second-guessing it.
//!
//! A client is a scoped session: acquired from the factory at the start of
//! one `execute` invocation and released on every exit path, never shared
//! across concurrent attempts.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ClientError, DomainKey, JobStatusReport, RemoteJobId, TaskRequest};

/// One session against the remote job service.
#[async_trait]
pub trait RemoteJobClient: Send + Sync {
    /// Submit a job. The domain key is the idempotency token: a repeated
    /// submit with the same key must not create a second logical job on the
    /// remote side (it returns the existing job's id instead).
    async fn submit(&self, domain_key: &DomainKey, params: &Value)
    -> Result<RemoteJobId, ClientError>;

    /// Observe the job's current status.
    async fn poll(&self, job_id: &RemoteJobId) -> Result<JobStatusReport, ClientError>;

    /// Fetch the result payload of a succeeded job.
    async fn fetch_result(&self, job_id: &RemoteJobId) -> Result<Value, ClientError>;

    /// Release session resources. Infallible: release runs on error paths
    /// too, where no caller could handle a second failure.
    async fn release(self: Box<Self>);
}

/// Opens a client session for one task's remote endpoint and credentials.
#[async_trait]
pub trait JobClientFactory: Send + Sync {
    async fn open(&self, request: &TaskRequest) -> Result<Box<dyn RemoteJobClient>, ClientError>;
}
