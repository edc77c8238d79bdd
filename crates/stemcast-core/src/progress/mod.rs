//! Process-wide progress registry keyed by (job id, stem type).
//!
//! One entry per job, one lock per stem: updates to different keys never
//! block each other, updates to the same key are serialized, and readers
//! always observe whole-record snapshots (no field-level interleaving).
//! Every successful update re-evaluates the job's aggregate status.

mod snapshot;

pub use snapshot::{JobSnapshot, StemSnapshot};

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::OrchestratorError;
use crate::model::{JobId, JobStatus, Stage, StemType, TrackMeta, UploadedVideoId};
use crate::orchestrator::aggregate;

/// Mutable progress record for one stem task. Guarded by its own mutex
/// inside the store; only the worker holding the task's lease writes it.
#[derive(Debug, Clone)]
pub struct StemProgress {
    pub stage: Stage,
    pub percent: u8,
    pub attempt: u32,
    pub last_error: Option<String>,
    pub result: Option<UploadedVideoId>,
}

impl StemProgress {
    /// Fresh record for a task that has not started.
    pub fn queued() -> Self {
        Self {
            stage: Stage::Queued,
            percent: 0,
            attempt: 0,
            last_error: None,
            result: None,
        }
    }

    /// Record rebuilt from a persisted row during recovery.
    pub fn restored(
        stage: Stage,
        attempt: u32,
        last_error: Option<String>,
        result: Option<UploadedVideoId>,
    ) -> Self {
        let percent = stage.percent().unwrap_or(0);
        Self {
            stage,
            percent,
            attempt,
            last_error,
            result,
        }
    }
}

/// One atomic mutation of a (job, stem) entry.
#[derive(Debug, Clone)]
pub enum StageUpdate {
    /// Advance to the next stage; clears the last error, resets the attempt.
    Advance(Stage),
    /// Same-stage retry: record the attempt number and the error that caused it.
    Attempt { attempt: u32, error: String },
    /// Terminal failure with the final error.
    Failed { error: String },
    /// Terminal success with the uploaded artifact id.
    Done { result: UploadedVideoId },
}

struct StatusCell {
    status: JobStatus,
    completed_at: Option<i64>,
}

struct JobEntry {
    meta: TrackMeta,
    created_at: i64,
    // Key set fixed at job creation; only the per-stem records mutate.
    stems: BTreeMap<StemType, Mutex<StemProgress>>,
    status: Mutex<StatusCell>,
}

/// Thread-safe registry of per-job progress records. Created at service
/// start and shared by the orchestrator and all workers; all mutation goes
/// through [`ProgressStore::update_stage`].
#[derive(Default)]
pub struct ProgressStore {
    jobs: RwLock<HashMap<JobId, Arc<JobEntry>>>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job's progress record with the given per-stem seed states.
    /// Seeds are `StemProgress::queued()` for fresh jobs, or restored rows
    /// during recovery. The aggregate status is derived from the seeds.
    pub fn insert_job(
        &self,
        job_id: JobId,
        created_at: i64,
        meta: TrackMeta,
        seeds: Vec<(StemType, StemProgress)>,
    ) {
        let stages: Vec<Stage> = seeds.iter().map(|(_, p)| p.stage).collect();
        let status = aggregate::evaluate(&stages);
        let completed_at = status.is_terminal().then_some(created_at);
        let entry = JobEntry {
            meta,
            created_at,
            stems: seeds
                .into_iter()
                .map(|(s, p)| (s, Mutex::new(p)))
                .collect(),
            status: Mutex::new(StatusCell {
                status,
                completed_at,
            }),
        };
        self.jobs.write().unwrap().insert(job_id, Arc::new(entry));
    }

    /// Drop a job's progress record (job removal, not completion).
    pub fn remove_job(&self, job_id: JobId) {
        self.jobs.write().unwrap().remove(&job_id);
    }

    /// Apply one update atomically and return the post-update snapshot.
    /// Re-evaluates the job's aggregate status as a side effect.
    pub fn update_stage(
        &self,
        job_id: JobId,
        stem: StemType,
        update: StageUpdate,
    ) -> Result<JobSnapshot, OrchestratorError> {
        let entry = self
            .entry(job_id)
            .ok_or(OrchestratorError::NotFound(job_id))?;
        {
            // The key set is fixed at job creation; a miss here is a broken
            // invariant, not a lookup the caller can recover from.
            let cell = entry.stems.get(&stem).ok_or_else(|| {
                OrchestratorError::Internal(anyhow::anyhow!(
                    "job {job_id} has no progress record for stem {stem}"
                ))
            })?;
            let mut p = cell.lock().unwrap();
            match update {
                StageUpdate::Advance(stage) => {
                    p.stage = stage;
                    if let Some(pct) = stage.percent() {
                        p.percent = pct.max(p.percent);
                    }
                    p.attempt = 1;
                    p.last_error = None;
                }
                StageUpdate::Attempt { attempt, error } => {
                    p.attempt = attempt;
                    p.last_error = Some(error);
                }
                StageUpdate::Failed { error } => {
                    p.stage = Stage::Failed;
                    p.last_error = Some(error);
                }
                StageUpdate::Done { result } => {
                    p.stage = Stage::Done;
                    p.percent = 100;
                    p.last_error = None;
                    p.result = Some(result);
                }
            }
        }
        self.reevaluate(&entry);
        Ok(Self::snapshot_entry(job_id, &entry))
    }

    /// Consistent snapshot of a job's progress, or `None` if unknown.
    pub fn snapshot(&self, job_id: JobId) -> Option<JobSnapshot> {
        self.entry(job_id)
            .map(|entry| Self::snapshot_entry(job_id, &entry))
    }

    fn entry(&self, job_id: JobId) -> Option<Arc<JobEntry>> {
        self.jobs.read().unwrap().get(&job_id).cloned()
    }

    /// Recompute the aggregate status from the current stem stages.
    /// Serialized on the status lock, recomputed from state rather than
    /// accumulated from events, and monotonic once terminal, so duplicate
    /// or out-of-order invocations cannot corrupt the result.
    fn reevaluate(&self, entry: &JobEntry) {
        let mut cell = entry.status.lock().unwrap();
        if cell.status.is_terminal() {
            return;
        }
        let stages: Vec<Stage> = entry
            .stems
            .values()
            .map(|m| m.lock().unwrap().stage)
            .collect();
        let status = aggregate::evaluate(&stages);
        if status != cell.status {
            cell.status = status;
            if status.is_terminal() {
                cell.completed_at = Some(crate::job_db::unix_timestamp());
            }
        }
    }

    // Lock order matches reevaluate: status cell first, then stems.
    fn snapshot_entry(job_id: JobId, entry: &JobEntry) -> JobSnapshot {
        let (status, completed_at) = {
            let cell = entry.status.lock().unwrap();
            (cell.status, cell.completed_at)
        };
        let stems = entry
            .stems
            .iter()
            .map(|(stem, m)| {
                let p = m.lock().unwrap();
                StemSnapshot {
                    stem: *stem,
                    stage: p.stage,
                    percent: p.percent,
                    attempt: p.attempt,
                    last_error: p.last_error.clone(),
                    result: p.result.clone(),
                }
            })
            .collect();
        JobSnapshot {
            job_id,
            status,
            meta: entry.meta.clone(),
            created_at: entry.created_at,
            completed_at,
            stems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_job(stems: &[StemType]) -> ProgressStore {
        let store = ProgressStore::new();
        let seeds = stems
            .iter()
            .map(|s| (*s, StemProgress::queued()))
            .collect();
        store.insert_job(1, 1_700_000_000, TrackMeta::default(), seeds);
        store
    }

    #[test]
    fn unknown_job_is_not_found() {
        let store = ProgressStore::new();
        assert!(store.snapshot(99).is_none());
        let err = store
            .update_stage(99, StemType::Vocals, StageUpdate::Advance(Stage::Separating))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound(99)));
    }

    #[test]
    fn unknown_stem_for_known_job_is_an_internal_error() {
        let store = store_with_job(&[StemType::Vocals]);
        let err = store
            .update_stage(1, StemType::Drums, StageUpdate::Advance(Stage::Separating))
            .unwrap_err();
        match err {
            OrchestratorError::Internal(e) => assert!(e.to_string().contains("drums")),
            other => panic!("expected Internal, got {other:?}"),
        }
    }

    #[test]
    fn fresh_job_is_pending_with_zero_percent() {
        let store = store_with_job(&[StemType::Vocals, StemType::Drums]);
        let snap = store.snapshot(1).unwrap();
        assert_eq!(snap.status, JobStatus::Pending);
        assert!(snap.stems.iter().all(|s| s.stage == Stage::Queued && s.percent == 0));
        assert!(snap.completed_at.is_none());
    }

    #[test]
    fn advance_clears_error_and_bumps_percent() {
        let store = store_with_job(&[StemType::Vocals]);
        store
            .update_stage(
                1,
                StemType::Vocals,
                StageUpdate::Attempt {
                    attempt: 2,
                    error: "blip".into(),
                },
            )
            .unwrap();
        let snap = store
            .update_stage(1, StemType::Vocals, StageUpdate::Advance(Stage::Rendering))
            .unwrap();
        let stem = &snap.stems[0];
        assert_eq!(stem.stage, Stage::Rendering);
        assert_eq!(stem.percent, 40);
        assert_eq!(stem.attempt, 1);
        assert!(stem.last_error.is_none());
        assert_eq!(snap.status, JobStatus::Running);
    }

    #[test]
    fn failed_keeps_last_reached_percent() {
        let store = store_with_job(&[StemType::Drums]);
        store
            .update_stage(1, StemType::Drums, StageUpdate::Advance(Stage::Uploading))
            .unwrap();
        let snap = store
            .update_stage(
                1,
                StemType::Drums,
                StageUpdate::Failed {
                    error: "auth".into(),
                },
            )
            .unwrap();
        assert_eq!(snap.stems[0].stage, Stage::Failed);
        assert_eq!(snap.stems[0].percent, 70);
        assert_eq!(snap.stems[0].last_error.as_deref(), Some("auth"));
    }

    #[test]
    fn terminal_status_is_frozen() {
        let store = store_with_job(&[StemType::Vocals]);
        let snap = store
            .update_stage(
                1,
                StemType::Vocals,
                StageUpdate::Done {
                    result: UploadedVideoId("vid".into()),
                },
            )
            .unwrap();
        assert_eq!(snap.status, JobStatus::Succeeded);
        let completed = snap.completed_at;
        assert!(completed.is_some());

        // A duplicate terminal update cannot change the frozen status.
        let snap2 = store
            .update_stage(
                1,
                StemType::Vocals,
                StageUpdate::Done {
                    result: UploadedVideoId("vid".into()),
                },
            )
            .unwrap();
        assert_eq!(snap2.status, JobStatus::Succeeded);
        assert_eq!(snap2.completed_at, completed);
    }

    #[test]
    fn concurrent_updates_to_sibling_stems_do_not_interleave_fields() {
        use std::sync::Arc;

        let store = Arc::new(ProgressStore::new());
        let seeds = vec![
            (StemType::Vocals, StemProgress::queued()),
            (StemType::Drums, StemProgress::queued()),
        ];
        store.insert_job(1, 0, TrackMeta::default(), seeds);

        let mut handles = Vec::new();
        for stem in [StemType::Vocals, StemType::Drums] {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for stage in [Stage::Separating, Stage::Rendering, Stage::Uploading] {
                    store
                        .update_stage(1, stem, StageUpdate::Advance(stage))
                        .unwrap();
                }
                store
                    .update_stage(
                        1,
                        stem,
                        StageUpdate::Done {
                            result: UploadedVideoId(format!("vid-{stem}")),
                        },
                    )
                    .unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let snap = store.snapshot(1).unwrap();
        assert_eq!(snap.status, JobStatus::Succeeded);
        for s in &snap.stems {
            assert_eq!(s.stage, Stage::Done);
            assert_eq!(s.percent, 100);
            assert!(s.last_error.is_none());
            assert_eq!(s.result.as_ref().unwrap().0, format!("vid-{}", s.stem));
        }
    }
}
