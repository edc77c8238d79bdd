//! Read-only progress snapshots handed to the service/presentation layer.

use serde::Serialize;

use crate::model::{JobId, JobStatus, Stage, StemType, TrackMeta, UploadedVideoId};

/// Point-in-time view of one stem task.
#[derive(Debug, Clone, Serialize)]
pub struct StemSnapshot {
    pub stem: StemType,
    pub stage: Stage,
    pub percent: u8,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub result: Option<UploadedVideoId>,
}

/// Point-in-time view of a whole job: aggregate status plus per-stem
/// stages, ordered by stem type. Suitable for periodic polling.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub meta: TrackMeta,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub stems: Vec<StemSnapshot>,
}

impl JobSnapshot {
    /// Overall percent estimate: mean of the per-stem percents.
    pub fn percent(&self) -> u8 {
        if self.stems.is_empty() {
            return 0;
        }
        let sum: u32 = self.stems.iter().map(|s| s.percent as u32).sum();
        (sum / self.stems.len() as u32) as u8
    }

    pub fn stem(&self, stem: StemType) -> Option<&StemSnapshot> {
        self.stems.iter().find(|s| s.stem == stem)
    }
}
