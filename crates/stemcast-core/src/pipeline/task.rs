//! Execution of one stem task: the Queued → ... → Done/Failed state machine.
//!
//! Runs on a blocking worker thread under an exclusive lease for its
//! (job, stem) key. Every transition goes through the progress store's
//! atomic update and is mirrored to the job database via the persistence
//! channel. Cancellation is cooperative and checked at stage boundaries;
//! an in-flight upload is always allowed to finish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::TaskError;
use crate::model::{JobId, JobSpec, Stage, StemType};
use crate::orchestrator::persist::TaskEvent;
use crate::progress::{ProgressStore, StageUpdate};
use crate::retry::{run_with_retry, RetryPolicy};

use super::collaborators::Collaborators;

/// Everything a worker needs to execute one leased stem task.
pub(crate) struct StemTaskCtx {
    pub job_id: JobId,
    pub stem: StemType,
    pub spec: Arc<JobSpec>,
    pub cancel: Arc<AtomicBool>,
    pub policy: RetryPolicy,
    pub store: Arc<ProgressStore>,
    pub collab: Collaborators,
    pub persist_tx: tokio::sync::mpsc::Sender<TaskEvent>,
}

impl StemTaskCtx {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Apply a progress update and mirror it to the persistence loop.
    fn apply(&self, update: StageUpdate) {
        match self.store.update_stage(self.job_id, self.stem, update) {
            Ok(snapshot) => {
                let _ = self.persist_tx.blocking_send(TaskEvent {
                    stem: self.stem,
                    snapshot,
                });
            }
            Err(e) => {
                // Job evicted underneath a running task; nothing to record.
                tracing::warn!(job_id = self.job_id, stem = %self.stem, "progress update dropped: {e}");
            }
        }
    }

    fn fail(&self, err: &TaskError) {
        match err {
            TaskError::Auth(_) => tracing::error!(
                job_id = self.job_id,
                stem = %self.stem,
                "stem task failed, operator intervention required: {err}"
            ),
            TaskError::Cancelled(_) => {
                tracing::info!(job_id = self.job_id, stem = %self.stem, "stem task cancelled")
            }
            _ => tracing::warn!(job_id = self.job_id, stem = %self.stem, "stem task failed: {err}"),
        }
        self.apply(StageUpdate::Failed {
            error: err.to_string(),
        });
    }

    /// Run one stage with the shared retry policy, recording each retry
    /// attempt in the progress record.
    fn run_stage<T>(&self, mut f: impl FnMut() -> Result<T, TaskError>) -> Result<T, TaskError> {
        run_with_retry(&self.policy, &mut f, |attempt, err, delay| {
            tracing::warn!(
                job_id = self.job_id,
                stem = %self.stem,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "stage failed, retrying: {err}"
            );
            self.apply(StageUpdate::Attempt {
                attempt,
                error: err.to_string(),
            });
        })
    }
}

/// Drive one stem task to a terminal stage. Returns the stage reached.
pub(crate) fn run_stem_task(ctx: StemTaskCtx) -> Stage {
    let Some(dest) = ctx.spec.destinations.get(&ctx.stem).cloned() else {
        // Submissions are validated; a missing destination means the spec
        // record was corrupted outside the engine.
        ctx.fail(&TaskError::InvalidSpec(
            "no destination configured for stem".to_string(),
        ));
        return Stage::Failed;
    };

    if ctx.cancelled() {
        ctx.fail(&TaskError::cancelled());
        return Stage::Failed;
    }

    ctx.apply(StageUpdate::Advance(Stage::Separating));
    let audio = match ctx.run_stage(|| ctx.collab.separation.separate(&ctx.spec.source_track, ctx.stem))
    {
        Ok(a) => a,
        Err(e) => {
            ctx.fail(&e);
            return Stage::Failed;
        }
    };

    if ctx.cancelled() {
        ctx.fail(&TaskError::cancelled());
        return Stage::Failed;
    }

    ctx.apply(StageUpdate::Advance(Stage::Rendering));
    let thumb = ctx.spec.thumbnail_spec(ctx.stem);
    let video = match ctx.run_stage(|| ctx.collab.renderer.render(&audio, &thumb)) {
        Ok(v) => v,
        Err(e) => {
            ctx.fail(&e);
            return Stage::Failed;
        }
    };

    // Last cancellation point before the upload begins.
    if ctx.cancelled() {
        ctx.fail(&TaskError::cancelled());
        return Stage::Failed;
    }

    ctx.apply(StageUpdate::Advance(Stage::Uploading));
    let uploaded = match ctx.run_stage(|| ctx.collab.upload.upload(&video, &dest.channel)) {
        Ok(id) => id,
        Err(e) => {
            ctx.fail(&e);
            return Stage::Failed;
        }
    };

    if ctx.cancelled() {
        // The upload was allowed to finish; keep the id in the error detail.
        ctx.fail(&TaskError::Cancelled(format!(
            "cancelled after upload completed (video {uploaded})"
        )));
        return Stage::Failed;
    }

    if let Some(playlist) = &dest.playlist {
        ctx.apply(StageUpdate::Advance(Stage::AddingToPlaylist));
        if let Err(e) = ctx.run_stage(|| ctx.collab.playlist.add_to_playlist(&uploaded, playlist)) {
            // Keep the error's own kind; only annotate it with the uploaded
            // id so the operator can finish the playlist step by hand.
            ctx.fail(&e.with_detail(&format!(
                "uploaded video {uploaded} was not added to playlist {playlist}"
            )));
            return Stage::Failed;
        }
    }

    tracing::info!(
        job_id = ctx.job_id,
        stem = %ctx.stem,
        video = %uploaded,
        "stem task completed"
    );
    ctx.apply(StageUpdate::Done { result: uploaded });
    Stage::Done
}
