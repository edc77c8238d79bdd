//! `stemcast remove <id>` – delete a job and its stem task records.

use anyhow::Result;
use stemcast_core::job_db::JobDb;

pub async fn run_remove(db: &JobDb, id: i64) -> Result<()> {
    db.remove_job(id).await?;
    println!("Removed job {id}");
    Ok(())
}
