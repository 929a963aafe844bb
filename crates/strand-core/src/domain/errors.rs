//! Error taxonomy.
//!
//! Classification authority: the remote client decides transient vs terminal
//! ([`ClientError::kind`]). The dispatch controller acts on that
//! classification but never re-classifies. The executor shell translates
//! everything into [`TaskExecutionError`] at its boundary; no client-specific
//! error type escapes it.

use thiserror::Error;

use super::job::RemoteJobId;

/// Operational classification of a remote client error.
///
/// - `Transient`: rate limiting, temporary unavailability; retried after the
///   retry interval, never surfaced to the user.
/// - `Terminal`: malformed job, authorization failure; surfaced, not retried
///   by this component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Terminal,
}

/// Error raised by the remote job client.
#[derive(Debug, Clone, Error)]
#[error("remote client error ({kind:?}): {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    pub message: String,

    /// The job the error relates to, when known (poll/fetch errors).
    pub job_id: Option<RemoteJobId>,
}

impl ClientError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
            job_id: None,
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Terminal,
            message: message.into(),
            job_id: None,
        }
    }

    pub fn for_job(mut self, job_id: RemoteJobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

/// Error from the durable state store.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state value for '{key}' has unexpected shape: {detail}")]
    Corrupt { key: String, detail: String },

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

/// Local configuration error: surfaced immediately, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(String),

    #[error("invalid value for '{key}': {detail}")]
    InvalidValue { key: String, detail: String },
}

/// Error from the dispatch controller. Internal: the controller may carry
/// raw client errors here, but the shell re-wraps before they escape.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    State(#[from] StateError),

    /// The remote side reported the job as terminally failed.
    #[error("remote job {job_id} failed: {detail}")]
    JobFailed {
        job_id: RemoteJobId,
        detail: String,
    },
}

/// The uniform task-level error the shell exposes to the outer engine.
///
/// Carries the remote job id when one exists and the remote-reported detail
/// as a plain string; the original client error type never crosses this
/// boundary.
#[derive(Debug, Error)]
pub enum TaskExecutionError {
    #[error("remote job {job_id} failed: {detail}")]
    JobFailed {
        job_id: RemoteJobId,
        detail: String,
    },

    #[error("remote client failure{}: {message}", job_context(.job_id))]
    Client {
        message: String,
        job_id: Option<RemoteJobId>,
    },

    #[error("state store failure: {0}")]
    State(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn job_context(job_id: &Option<RemoteJobId>) -> String {
    match job_id {
        Some(id) => format!(" (job {id})"),
        None => String::new(),
    }
}

impl TaskExecutionError {
    /// The remote job this failure relates to, if one was ever submitted.
    pub fn job_id(&self) -> Option<&RemoteJobId> {
        match self {
            TaskExecutionError::JobFailed { job_id, .. } => Some(job_id),
            TaskExecutionError::Client { job_id, .. } => job_id.as_ref(),
            TaskExecutionError::State(_) | TaskExecutionError::Config(_) => None,
        }
    }
}

impl From<ClientError> for TaskExecutionError {
    fn from(err: ClientError) -> Self {
        TaskExecutionError::Client {
            message: err.to_string(),
            job_id: err.job_id,
        }
    }
}

impl From<StateError> for TaskExecutionError {
    fn from(err: StateError) -> Self {
        TaskExecutionError::State(err.to_string())
    }
}

impl From<DispatchError> for TaskExecutionError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Client(e) => e.into(),
            DispatchError::State(e) => e.into(),
            DispatchError::JobFailed { job_id, detail } => {
                TaskExecutionError::JobFailed { job_id, detail }
            }
        }
    }
}
