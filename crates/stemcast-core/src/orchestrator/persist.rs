//! Write-behind persistence: stream progress updates to the job database.
//!
//! Workers update the in-memory store synchronously (that is the source of
//! truth for races) and then send the resulting snapshot over a channel.
//! This loop applies the snapshots to SQLite so jobs survive a restart.
//! A failed write is logged and skipped; it never blocks a worker.

use crate::job_db::JobDb;
use crate::model::StemType;
use crate::progress::JobSnapshot;

/// One persisted progress update: the stem that changed plus the job
/// snapshot taken right after the change.
#[derive(Debug, Clone)]
pub struct TaskEvent {
    pub stem: StemType,
    pub snapshot: JobSnapshot,
}

/// Runs the persistence loop until all event senders are dropped.
/// Spawn with `tokio::spawn`; drop the last sender to drain and stop.
pub(super) async fn run_persistence_loop(
    mut rx: tokio::sync::mpsc::Receiver<TaskEvent>,
    db: JobDb,
) {
    while let Some(ev) = rx.recv().await {
        let job_id = ev.snapshot.job_id;
        if let Some(stem) = ev.snapshot.stem(ev.stem) {
            if db.update_stem_task(job_id, stem).await.is_err() {
                tracing::warn!(job_id, stem = %ev.stem, "durable stem update failed");
            }
        }
        if db
            .set_job_status(job_id, ev.snapshot.status, ev.snapshot.completed_at)
            .await
            .is_err()
        {
            tracing::warn!(job_id, "durable job status update failed");
        }
    }
}
