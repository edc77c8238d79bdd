//! Job read operations: list, get, and recovery loading.

use anyhow::Result;
use sqlx::Row;

use crate::model::{JobId, JobSpec, JobStatus, Stage, StemType};

use super::super::db::JobDb;
use super::super::types::{JobListing, JobRow, StemTaskRow};

fn job_row_from(row: &sqlx::sqlite::SqliteRow) -> JobRow {
    let cancel_requested: i64 = row.get("cancel_requested");
    JobRow {
        id: row.get("id"),
        spec_json: row.get("spec_json"),
        status: JobStatus::from_str(&row.get::<String, _>("status")),
        cancel_requested: cancel_requested != 0,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        completed_at: row.get("completed_at"),
    }
}

impl JobDb {
    /// List all jobs, newest first, with artist/title pulled out of the spec.
    pub async fn list_jobs(&self) -> Result<Vec<JobListing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, spec_json, status, created_at
            FROM jobs
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let spec_json: String = row.get("spec_json");
            let (artist, title) = serde_json::from_str::<JobSpec>(&spec_json)
                .map(|s| (s.meta.artist, s.meta.title))
                .unwrap_or_default();
            out.push(JobListing {
                id: row.get("id"),
                status: JobStatus::from_str(&row.get::<String, _>("status")),
                artist,
                title,
                created_at: row.get("created_at"),
            });
        }
        Ok(out)
    }

    /// Fetch one job with its stem-task rows, or None if unknown.
    pub async fn get_job(&self, id: JobId) -> Result<Option<(JobRow, Vec<StemTaskRow>)>> {
        let row = sqlx::query(
            r#"
            SELECT id, spec_json, status, cancel_requested, created_at, updated_at, completed_at
            FROM jobs
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let job = job_row_from(&row);
        let stems = self.stem_tasks_for(id).await?;
        Ok(Some((job, stems)))
    }

    /// All jobs that have not reached a terminal status, with their stem
    /// rows. Used on startup to rebuild progress records and requeue work.
    pub async fn load_unfinished(&self) -> Result<Vec<(JobRow, Vec<StemTaskRow>)>> {
        let rows = sqlx::query(
            r#"
            SELECT id, spec_json, status, cancel_requested, created_at, updated_at, completed_at
            FROM jobs
            WHERE status IN ('pending', 'running')
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let job = job_row_from(&row);
            let stems = self.stem_tasks_for(job.id).await?;
            out.push((job, stems));
        }
        Ok(out)
    }

    async fn stem_tasks_for(&self, job_id: JobId) -> Result<Vec<StemTaskRow>> {
        let rows = sqlx::query(
            r#"
            SELECT job_id, stem, stage, attempt, last_error, result_id, updated_at
            FROM stem_tasks
            WHERE job_id = ?1
            ORDER BY stem ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let stem_str: String = row.get("stem");
            let Some(stem) = StemType::parse(&stem_str) else {
                tracing::warn!(job_id, stem = %stem_str, "skipping row with unknown stem type");
                continue;
            };
            let attempt: i64 = row.get("attempt");
            out.push(StemTaskRow {
                job_id: row.get("job_id"),
                stem,
                stage: Stage::from_str(&row.get::<String, _>("stage")),
                attempt: attempt as u32,
                last_error: row.get("last_error"),
                result_id: row.get("result_id"),
                updated_at: row.get("updated_at"),
            });
        }
        Ok(out)
    }
}
