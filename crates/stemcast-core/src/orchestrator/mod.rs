//! Job orchestrator: accepts submissions, fans them out into per-stem
//! tasks, dispatches the tasks to a bounded worker pool, and aggregates
//! their terminal states into the job's final status.

pub mod aggregate;
mod dispatch;
pub(crate) mod persist;

pub use persist::TaskEvent;

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::config::StemcastConfig;
use crate::control::CancelRegistry;
use crate::error::OrchestratorError;
use crate::job_db::{JobDb, JobRow, StemTaskRow};
use crate::model::{JobId, JobSpec, Stage, StemType, Submission, TrackMeta, UploadedVideoId};
use crate::pipeline::Collaborators;
use crate::progress::{JobSnapshot, ProgressStore, StemProgress, StemSnapshot};
use crate::retry::RetryPolicy;

/// One queued (job, stem) unit of work awaiting a worker lease.
struct QueuedTask {
    job_id: JobId,
    stem: StemType,
    spec: Arc<JobSpec>,
}

/// The orchestration engine. Owns the progress store, the cancel registry,
/// the FIFO dispatch queue, and the write-behind persistence loop.
///
/// Create inside a tokio runtime (the persistence loop is spawned on it).
pub struct Orchestrator {
    global_cap: usize,
    per_job_cap: usize,
    policy: RetryPolicy,
    store: Arc<ProgressStore>,
    control: Arc<CancelRegistry>,
    collab: Collaborators,
    db: JobDb,
    queue: Mutex<VecDeque<QueuedTask>>,
    persist_tx: tokio::sync::mpsc::Sender<TaskEvent>,
    persist_handle: tokio::task::JoinHandle<()>,
}

impl Orchestrator {
    pub fn new(cfg: &StemcastConfig, collab: Collaborators, db: JobDb) -> Self {
        let (persist_tx, persist_rx) = tokio::sync::mpsc::channel(64);
        let persist_handle = tokio::spawn(persist::run_persistence_loop(persist_rx, db.clone()));
        Self {
            global_cap: cfg.max_concurrent_tasks.max(1),
            per_job_cap: cfg.max_tasks_per_job.max(1),
            policy: cfg.retry_policy(),
            store: Arc::new(ProgressStore::new()),
            control: Arc::new(CancelRegistry::new()),
            collab,
            db,
            queue: Mutex::new(VecDeque::new()),
            persist_tx,
            persist_handle,
        }
    }

    /// Validate and accept a submission: persist the job plus one queued
    /// stem task per requested stem, register its progress record and
    /// cancel token, and enqueue the tasks. Nothing is created when
    /// validation fails.
    pub async fn submit(&self, submission: Submission) -> Result<JobId, OrchestratorError> {
        let spec = submission.validate()?;
        let job_id = self.db.add_job(&spec).await?;

        let created_at = crate::job_db::unix_timestamp();
        let seeds = spec
            .stems
            .iter()
            .map(|s| (*s, StemProgress::queued()))
            .collect();
        self.store
            .insert_job(job_id, created_at, spec.meta.clone(), seeds);
        self.control.register(job_id);

        let spec = Arc::new(spec);
        {
            let mut queue = self.queue.lock().unwrap();
            for stem in &spec.stems {
                queue.push_back(QueuedTask {
                    job_id,
                    stem: *stem,
                    spec: Arc::clone(&spec),
                });
            }
        }
        tracing::info!(job_id, stems = spec.stems.len(), "job submitted");
        Ok(job_id)
    }

    /// Current job snapshot: aggregate status plus per-stem stages and
    /// errors. Always coherent, even while stems are mid-flight. Falls back
    /// to the database for jobs from a previous process lifetime.
    pub async fn get_status(&self, job_id: JobId) -> Result<JobSnapshot, OrchestratorError> {
        if let Some(snapshot) = self.store.snapshot(job_id) {
            return Ok(snapshot);
        }
        let Some((job, stems)) = self.db.get_job(job_id).await? else {
            return Err(OrchestratorError::NotFound(job_id));
        };
        Ok(snapshot_from_rows(&job, &stems))
    }

    /// Poll interface for a presentation layer: the in-memory progress
    /// record only (no database access).
    pub fn poll_progress(&self, job_id: JobId) -> Result<JobSnapshot, OrchestratorError> {
        self.store
            .snapshot(job_id)
            .ok_or(OrchestratorError::NotFound(job_id))
    }

    /// Request cooperative cancellation. Stems that have not started
    /// uploading will fail with a cancellation error at their next stage
    /// boundary; a stem already uploading finishes its in-flight call.
    pub async fn cancel(&self, job_id: JobId) -> Result<(), OrchestratorError> {
        let known =
            self.store.snapshot(job_id).is_some() || self.db.get_job(job_id).await?.is_some();
        if !known {
            return Err(OrchestratorError::NotFound(job_id));
        }
        self.control.cancel(job_id);
        self.db.request_cancel(job_id).await?;
        tracing::info!(job_id, "cancellation requested");
        Ok(())
    }

    /// Rebuild state after a restart: requeue stem tasks that were
    /// interrupted mid-flight and reload unfinished jobs into the progress
    /// store and dispatch queue. Returns the number of jobs reloaded.
    pub async fn recover(&self) -> Result<usize, OrchestratorError> {
        let reset = self.db.recover_interrupted().await?;
        if reset > 0 {
            tracing::info!(reset, "requeued stem tasks interrupted by restart");
        }

        let mut reloaded = 0usize;
        for (job, stems) in self.db.load_unfinished().await? {
            if self.store.snapshot(job.id).is_some() {
                continue;
            }

            // A crash can land between a stem-row write and the job-row
            // write, leaving every stem terminal under a non-terminal job
            // row. Nothing is left to run for such a job; finalize the row
            // here instead of reloading it forever.
            let stages: Vec<Stage> = stems.iter().map(|r| r.stage).collect();
            let status = aggregate::evaluate(&stages);
            if status.is_terminal() {
                self.db
                    .set_job_status(job.id, status, Some(crate::job_db::unix_timestamp()))
                    .await?;
                tracing::info!(
                    job_id = job.id,
                    status = status.as_str(),
                    "finalized job whose stem tasks had already finished"
                );
                continue;
            }

            let spec: JobSpec = serde_json::from_str(&job.spec_json)
                .with_context(|| format!("corrupt spec for job {}", job.id))?;

            let seeds = stems
                .iter()
                .map(|r| {
                    (
                        r.stem,
                        StemProgress::restored(
                            r.stage,
                            r.attempt,
                            r.last_error.clone(),
                            r.result_id.clone().map(UploadedVideoId),
                        ),
                    )
                })
                .collect();
            self.store
                .insert_job(job.id, job.created_at, spec.meta.clone(), seeds);
            let token = self.control.register(job.id);
            if job.cancel_requested {
                token.store(true, Ordering::Relaxed);
            }

            let spec = Arc::new(spec);
            let mut queue = self.queue.lock().unwrap();
            for row in stems.iter().filter(|r| r.stage == Stage::Queued) {
                queue.push_back(QueuedTask {
                    job_id: job.id,
                    stem: row.stem,
                    spec: Arc::clone(&spec),
                });
            }
            drop(queue);
            reloaded += 1;
        }
        if reloaded > 0 {
            tracing::info!(reloaded, "reloaded unfinished jobs");
        }
        Ok(reloaded)
    }

    /// Remove a job entirely: its rows, its progress record, and its
    /// cancel token. Queued tasks of the job are dropped from the dispatch
    /// queue; a task already leased to a worker runs to its terminal stage
    /// but its updates are discarded.
    pub async fn remove(&self, job_id: JobId) -> Result<(), OrchestratorError> {
        let known =
            self.store.snapshot(job_id).is_some() || self.db.get_job(job_id).await?.is_some();
        if !known {
            return Err(OrchestratorError::NotFound(job_id));
        }
        self.queue.lock().unwrap().retain(|t| t.job_id != job_id);
        self.store.remove_job(job_id);
        self.control.unregister(job_id);
        self.db.remove_job(job_id).await?;
        tracing::info!(job_id, "job removed");
        Ok(())
    }

    /// Flush and stop the persistence loop. Call after the dispatch loop is
    /// idle so every progress update reaches the database.
    pub async fn shutdown(self) -> Result<(), OrchestratorError> {
        let Orchestrator {
            persist_tx,
            persist_handle,
            ..
        } = self;
        drop(persist_tx);
        persist_handle
            .await
            .map_err(|e| anyhow::anyhow!("persistence loop join: {e}"))?;
        Ok(())
    }
}

/// Snapshot built from persisted rows (job no longer live in this process).
fn snapshot_from_rows(job: &JobRow, stems: &[StemTaskRow]) -> JobSnapshot {
    let meta = serde_json::from_str::<JobSpec>(&job.spec_json)
        .map(|s| s.meta)
        .unwrap_or_else(|_| TrackMeta::default());
    JobSnapshot {
        job_id: job.id,
        status: job.status,
        meta,
        created_at: job.created_at,
        completed_at: job.completed_at,
        stems: stems
            .iter()
            .map(|r| StemSnapshot {
                stem: r.stem,
                stage: r.stage,
                percent: match r.stage {
                    Stage::Done => 100,
                    s => s.percent().unwrap_or(0),
                },
                attempt: r.attempt,
                last_error: r.last_error.clone(),
                result: r.result_id.clone().map(UploadedVideoId),
            })
            .collect(),
    }
}
