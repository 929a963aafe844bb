//! Remote job status and the logical dispatch state machine.

use serde::{Deserialize, Serialize};

/// Status reported by the remote service for a submitted job.
///
/// Serialized as SCREAMING_SNAKE_CASE to match the remote wire vocabulary:
/// RUNNING / SUCCEEDED / FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteJobStatus {
    Running,
    Succeeded,
    Failed,
}

impl RemoteJobStatus {
    /// Is this a terminal status (no further polling needed)?
    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteJobStatus::Succeeded | RemoteJobStatus::Failed)
    }
}

/// One poll observation: status plus optional remote-reported detail.
///
/// `detail` carries the remote failure message when the job failed; it ends
/// up verbatim in the surfaced task error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: RemoteJobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl JobStatusReport {
    pub fn running() -> Self {
        Self {
            status: RemoteJobStatus::Running,
            detail: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            status: RemoteJobStatus::Succeeded,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: RemoteJobStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// Logical state of one dispatch, derived from durable state plus the last
/// poll observation. Never stored; the durable job-id record and the remote
/// status are the ground truth, this is a view over them.
///
/// Transitions:
/// - NotSubmitted -> SubmittedPending (atomic with the durable job-id write)
/// - SubmittedPending -> Running -> Succeeded | Failed
/// - a restart in SubmittedPending/Running re-enters the same state by
///   re-reading the persisted id; it never re-submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    NotSubmitted,
    SubmittedPending,
    Running,
    Succeeded,
    Failed,
}

impl DispatchState {
    /// Derive the logical state from "is a job id recorded" and the most
    /// recently observed remote status (if any poll has happened yet).
    pub fn derive(job_id_recorded: bool, last_status: Option<RemoteJobStatus>) -> Self {
        if !job_id_recorded {
            return DispatchState::NotSubmitted;
        }
        match last_status {
            None => DispatchState::SubmittedPending,
            Some(RemoteJobStatus::Running) => DispatchState::Running,
            Some(RemoteJobStatus::Succeeded) => DispatchState::Succeeded,
            Some(RemoteJobStatus::Failed) => DispatchState::Failed,
        }
    }
}
