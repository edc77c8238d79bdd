//! Error taxonomy for stem tasks and the public orchestrator API.

use thiserror::Error;

use crate::model::JobId;

/// Failure of one stem task stage. Classification into retry behaviour
/// lives in `retry::classify`; this type only carries what went wrong.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// The separation engine failed to produce the stem audio.
    #[error("separation failed: {0}")]
    Separation(String),

    /// The renderer failed to produce the stem video.
    #[error("render failed: {0}")]
    Render(String),

    /// Upload credentials invalid or expired. Never retried; requires
    /// operator intervention (re-auth against the destination platform).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Destination platform quota exhausted. Retried with a longer backoff.
    #[error("quota exceeded: {0}")]
    Quota(String),

    /// Network or infrastructure blip. Retried with standard backoff.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The configured playlist does not exist on the destination.
    #[error("playlist not found: {0}")]
    PlaylistNotFound(String),

    /// The task was stopped cooperatively; not a true failure.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// The persisted job spec is inconsistent with its stem tasks. Not a
    /// collaborator failure and never retried.
    #[error("invalid job spec: {0}")]
    InvalidSpec(String),
}

impl TaskError {
    pub fn cancelled() -> Self {
        TaskError::Cancelled("job cancelled before task completed".to_string())
    }

    /// Append context to the error detail without changing its kind.
    pub fn with_detail(self, detail: &str) -> Self {
        let append = |s: String| format!("{s}; {detail}");
        match self {
            TaskError::Separation(s) => TaskError::Separation(append(s)),
            TaskError::Render(s) => TaskError::Render(append(s)),
            TaskError::Auth(s) => TaskError::Auth(append(s)),
            TaskError::Quota(s) => TaskError::Quota(append(s)),
            TaskError::Transient(s) => TaskError::Transient(append(s)),
            TaskError::PlaylistNotFound(s) => TaskError::PlaylistNotFound(append(s)),
            TaskError::Cancelled(s) => TaskError::Cancelled(append(s)),
            TaskError::InvalidSpec(s) => TaskError::InvalidSpec(append(s)),
        }
    }
}

/// Errors surfaced by the orchestrator's public operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Bad submission; rejected before any job or task is created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown job id.
    #[error("job {0} not found")]
    NotFound(JobId),

    /// Persistence or runtime failure underneath the public API.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
