//! `stemcast status [id]` – list all jobs, or per-stem detail for one.

use anyhow::Result;
use stemcast_core::job_db::JobDb;
use stemcast_core::model::Stage;

pub async fn run_status(db: &JobDb, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) => show_job(db, id).await,
        None => list_all(db).await,
    }
}

async fn list_all(db: &JobDb) -> Result<()> {
    let jobs = db.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in database.");
        return Ok(());
    }
    println!("{:<6} {:<18} {}", "ID", "STATUS", "TRACK");
    for j in jobs {
        println!(
            "{:<6} {:<18} {} - {}",
            j.id,
            j.status.as_str(),
            j.artist,
            j.title
        );
    }
    Ok(())
}

async fn show_job(db: &JobDb, id: i64) -> Result<()> {
    let Some((row, stems)) = db.get_job(id).await? else {
        println!("No job with id {id}.");
        return Ok(());
    };

    println!("Job {id}: {}", row.status.as_str());
    println!("{:<12} {:<16} {:<8} {}", "STEM", "STAGE", "ATTEMPT", "DETAIL");
    for s in stems {
        let detail = match s.stage {
            Stage::Done => s.result_id.unwrap_or_default(),
            Stage::Failed => s.last_error.unwrap_or_default(),
            _ => s
                .stage
                .percent()
                .map(|p| format!("{p}%"))
                .unwrap_or_default(),
        };
        println!(
            "{:<12} {:<16} {:<8} {}",
            s.stem.to_string(),
            s.stage.as_str(),
            s.attempt,
            detail
        );
    }
    Ok(())
}
