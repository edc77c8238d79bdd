//! Dispatch loop: lease queued stem tasks to a bounded worker pool.
//!
//! Two limits hold simultaneously: a global cap on concurrently executing
//! stem tasks and a per-job cap. Dispatch is FIFO in submission order; a
//! task blocked only by its job's cap is skipped over without stalling
//! tasks of other jobs behind it. Each task is leased to exactly one
//! blocking worker and runs to a terminal stage there.

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::OrchestratorError;
use crate::model::{JobId, Stage};
use crate::pipeline::{run_stem_task, StemTaskCtx};

use super::{Orchestrator, QueuedTask};

impl Orchestrator {
    /// Drain the dispatch queue, keeping up to `max_concurrent_tasks`
    /// workers busy, and return once every queued task has reached a
    /// terminal stage. Safe to call again after further submissions.
    pub async fn run_until_idle(&self) -> Result<(), OrchestratorError> {
        let mut join_set: JoinSet<(JobId, Stage)> = JoinSet::new();
        let mut running: HashMap<JobId, usize> = HashMap::new();

        loop {
            while join_set.len() < self.global_cap {
                let Some(task) = self.claim_next(&running) else {
                    break;
                };
                let job_id = task.job_id;
                *running.entry(job_id).or_insert(0) += 1;

                let cancel = self
                    .control
                    .token(job_id)
                    .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));
                let ctx = StemTaskCtx {
                    job_id,
                    stem: task.stem,
                    spec: task.spec,
                    cancel,
                    policy: self.policy,
                    store: Arc::clone(&self.store),
                    collab: self.collab.clone(),
                    persist_tx: self.persist_tx.clone(),
                };
                tracing::debug!(job_id, stem = %ctx.stem, "stem task leased");
                join_set.spawn_blocking(move || {
                    let stage = run_stem_task(ctx);
                    (job_id, stage)
                });
            }

            if join_set.is_empty() {
                break;
            }
            let Some(res) = join_set.join_next().await else {
                break;
            };
            let (job_id, _stage) = res.map_err(|e| anyhow::anyhow!("stem task join: {e}"))?;
            if let Some(n) = running.get_mut(&job_id) {
                *n -= 1;
                if *n == 0 {
                    running.remove(&job_id);
                }
            }
            self.finish_job_if_terminal(job_id);
        }

        Ok(())
    }

    /// Pop the first queued task whose job is under its per-job cap.
    fn claim_next(&self, running: &HashMap<JobId, usize>) -> Option<QueuedTask> {
        let mut queue = self.queue.lock().unwrap();
        let pos = queue
            .iter()
            .position(|t| running.get(&t.job_id).copied().unwrap_or(0) < self.per_job_cap)?;
        queue.remove(pos)
    }

    fn finish_job_if_terminal(&self, job_id: JobId) {
        let Some(snapshot) = self.store.snapshot(job_id) else {
            return;
        };
        if snapshot.status.is_terminal() {
            self.control.unregister(job_id);
            tracing::info!(job_id, status = snapshot.status.as_str(), "job finished");
        }
    }
}
