//! Row types read back from the job database.

use crate::model::{JobId, JobStatus, Stage, StemType};

/// One persisted job row. `spec_json` is the serialized `JobSpec`.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: JobId,
    pub spec_json: String,
    pub status: JobStatus,
    pub cancel_requested: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

/// One persisted stem task row.
#[derive(Debug, Clone)]
pub struct StemTaskRow {
    pub job_id: JobId,
    pub stem: StemType,
    pub stage: Stage,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub result_id: Option<String>,
    pub updated_at: i64,
}

/// Compact listing row for `stemcast status`.
#[derive(Debug, Clone)]
pub struct JobListing {
    pub id: JobId,
    pub status: JobStatus,
    pub artist: String,
    pub title: String,
    pub created_at: i64,
}
