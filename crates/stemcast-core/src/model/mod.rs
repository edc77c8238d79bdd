//! Domain model: stem types, task stages, job status, and submissions.

use serde::{Deserialize, Serialize};

mod job;
mod stage;
mod stem;

pub use job::{
    default_destination, Destination, JobId, JobSpec, StemAudioRef, Submission, ThumbnailSpec,
    TrackMeta, TrackRef, UploadedVideoId, VideoRef,
};
pub use stage::Stage;
pub use stem::StemType;

/// High-level job status, derived from the terminal states of the job's
/// stem tasks by the aggregation rule (never set directly by a task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    PartiallyFailed,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::PartiallyFailed => "partially_failed",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => JobStatus::Pending,
            "running" => JobStatus::Running,
            "partially_failed" => JobStatus::PartiallyFailed,
            "succeeded" => JobStatus::Succeeded,
            _ => JobStatus::Failed,
        }
    }

    /// Terminal statuses are frozen; aggregation never overwrites them.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::PartiallyFailed
        )
    }
}
