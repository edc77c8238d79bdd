//! Job write operations: add, stage updates, status, cancel, recover, remove.

use anyhow::Result;

use crate::model::{JobId, JobSpec, JobStatus, Stage};
use crate::progress::StemSnapshot;

use super::super::db::{unix_timestamp, JobDb};

impl JobDb {
    /// Insert a new pending job plus one queued stem-task row per requested
    /// stem, in a single transaction. Returns the assigned job id.
    pub async fn add_job(&self, spec: &JobSpec) -> Result<JobId> {
        let now = unix_timestamp();
        let spec_json = serde_json::to_string(spec)?;

        let mut tx = self.pool.begin().await?;
        let job_id = sqlx::query(
            r#"
            INSERT INTO jobs (spec_json, status, cancel_requested, created_at, updated_at, completed_at)
            VALUES (?1, ?2, 0, ?3, ?4, NULL)
            "#,
        )
        .bind(&spec_json)
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for stem in &spec.stems {
            sqlx::query(
                r#"
                INSERT INTO stem_tasks (job_id, stem, stage, attempt, last_error, result_id, updated_at)
                VALUES (?1, ?2, ?3, 0, NULL, NULL, ?4)
                "#,
            )
            .bind(job_id)
            .bind(stem.as_str())
            .bind(Stage::Queued.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(job_id)
    }

    /// Mirror one stem task's current progress record into its row.
    pub async fn update_stem_task(&self, job_id: JobId, stem: &StemSnapshot) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE stem_tasks
            SET stage = ?1,
                attempt = ?2,
                last_error = ?3,
                result_id = ?4,
                updated_at = ?5
            WHERE job_id = ?6 AND stem = ?7
            "#,
        )
        .bind(stem.stage.as_str())
        .bind(stem.attempt as i64)
        .bind(&stem.last_error)
        .bind(stem.result.as_ref().map(|r| r.0.clone()))
        .bind(now)
        .bind(job_id)
        .bind(stem.stem.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Update a job's aggregate status (and completion time once terminal).
    /// A row already in a terminal status is never overwritten, so a stale
    /// snapshot applied by the persistence loop after the terminal write
    /// cannot regress the job.
    pub async fn set_job_status(
        &self,
        id: JobId,
        status: JobStatus,
        completed_at: Option<i64>,
    ) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?1,
                completed_at = ?2,
                updated_at = ?3
            WHERE id = ?4
              AND status NOT IN ('succeeded', 'failed', 'partially_failed')
            "#,
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a cancellation request so it survives restarts and reaches a
    /// worker process started later. Returns false for unknown job ids.
    pub async fn request_cancel(&self, id: JobId) -> Result<bool> {
        let now = unix_timestamp();
        let r = sqlx::query(
            r#"
            UPDATE jobs
            SET cancel_requested = 1,
                updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected() > 0)
    }

    /// Normalize rows stranded mid-flight by a crash: any stem task left in
    /// a non-terminal, non-queued stage goes back to `queued` with its
    /// attempt counter reset, and `running` jobs go back to `pending`.
    /// Call before scheduling. Returns the number of stem rows reset.
    pub async fn recover_interrupted(&self) -> Result<u64> {
        let now = unix_timestamp();
        let r = sqlx::query(
            r#"
            UPDATE stem_tasks
            SET stage = 'queued',
                attempt = 0,
                last_error = NULL,
                updated_at = ?1
            WHERE stage NOT IN ('queued', 'done', 'failed')
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'pending',
                updated_at = ?1
            WHERE status = 'running'
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(r.rows_affected())
    }

    /// Permanently remove a job and its stem-task rows.
    pub async fn remove_job(&self, id: JobId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM stem_tasks WHERE job_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM jobs WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
