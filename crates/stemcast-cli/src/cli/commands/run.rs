//! `stemcast run` – run the worker pool until every queued stem task is done.

use anyhow::{bail, Result};
use stemcast_core::config::StemcastConfig;
use stemcast_core::job_db::JobDb;
use stemcast_core::orchestrator::Orchestrator;

use crate::cli::exec::CommandPipeline;

pub async fn run_pipeline(db: &JobDb, cfg: &StemcastConfig, tasks: Option<usize>) -> Result<()> {
    let Some(commands) = cfg.commands.clone() else {
        bail!(
            "no [commands] section in config; configure separate/render/upload \
             command templates before running the pipeline"
        );
    };
    let pipeline = CommandPipeline::new(commands);

    let mut cfg = cfg.clone();
    if let Some(n) = tasks {
        cfg.max_concurrent_tasks = n.max(1);
    }

    let orch = Orchestrator::new(&cfg, pipeline.collaborators(), db.clone());
    let recovered = orch.recover().await?;
    if recovered > 0 {
        tracing::info!("recovered {recovered} unfinished job(s) from previous run");
    }
    if recovered == 0 {
        println!("No unfinished jobs.");
        orch.shutdown().await?;
        return Ok(());
    }

    orch.run_until_idle().await?;

    for listing in db.list_jobs().await? {
        if let Ok(snap) = orch.poll_progress(listing.id) {
            println!(
                "Job {} ({} - {}): {} [{}%]",
                listing.id,
                snap.meta.artist,
                snap.meta.title,
                snap.status.as_str(),
                snap.percent()
            );
        }
    }

    orch.shutdown().await?;
    Ok(())
}
