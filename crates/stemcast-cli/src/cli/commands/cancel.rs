//! `stemcast cancel <id>` – request cooperative cancellation of a job.

use anyhow::Result;
use stemcast_core::job_db::JobDb;

/// Sets the durable cancel flag. A running `stemcast run` in another
/// process picks it up on its next recovery; tasks already past their
/// last cancellation point finish their upload first.
pub async fn run_cancel(db: &JobDb, id: i64) -> Result<()> {
    if db.request_cancel(id).await? {
        println!("Requested cancellation of job {id}");
    } else {
        println!("No job with id {id}.");
    }
    Ok(())
}
