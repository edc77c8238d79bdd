//! CLI for the stemcast pipeline orchestrator.

mod commands;
mod exec;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stemcast_core::config;
use stemcast_core::job_db::JobDb;

use commands::{run_cancel, run_pipeline, run_remove, run_status, run_submit, SubmitArgs};

/// Top-level CLI for the stemcast pipeline orchestrator.
#[derive(Debug, Parser)]
#[command(name = "stemcast")]
#[command(about = "stemcast: stem-separation pipeline orchestrator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit a new stem-split job for a source track.
    Submit {
        /// Path or URL of the mixed source track.
        track: String,

        /// Stem to produce (repeatable). Defaults to all stem types.
        #[arg(long = "stem", value_name = "STEM")]
        stems: Vec<String>,

        /// Track artist, used in video titles.
        #[arg(long)]
        artist: String,

        /// Track title, used in video titles.
        #[arg(long)]
        title: String,

        /// Track tempo in BPM.
        #[arg(long, default_value = "0")]
        bpm: u32,

        /// Musical key (e.g. "F min"). Omitted from drum video titles.
        #[arg(long)]
        key: Option<String>,

        /// Genre tag carried through to the destination.
        #[arg(long)]
        genre: Option<String>,

        /// Override the destination channel for one stem, as STEM=CHANNEL.
        #[arg(long = "channel", value_name = "STEM=CHANNEL")]
        channels: Vec<String>,

        /// Add one stem's upload to a playlist, as STEM=PLAYLIST.
        #[arg(long = "playlist", value_name = "STEM=PLAYLIST")]
        playlists: Vec<String>,
    },

    /// Run the worker pool until all queued stem tasks are done.
    Run {
        /// Run up to N stem tasks concurrently across all jobs.
        #[arg(long, value_name = "N")]
        tasks: Option<usize>,
    },

    /// Show all jobs, or per-stem detail for one job.
    Status {
        /// Job identifier; omit to list all jobs.
        id: Option<i64>,
    },

    /// Request cancellation of a job by its ID.
    Cancel {
        /// Job identifier.
        id: i64,
    },

    /// Remove a job and its stem task records by ID.
    Remove {
        /// Job identifier.
        id: i64,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let db = JobDb::open_default().await?;

        match cli.command {
            CliCommand::Submit {
                track,
                stems,
                artist,
                title,
                bpm,
                key,
                genre,
                channels,
                playlists,
            } => {
                let args = SubmitArgs {
                    track,
                    stems,
                    artist,
                    title,
                    bpm,
                    key,
                    genre,
                    channels,
                    playlists,
                };
                run_submit(&db, args).await?;
            }
            CliCommand::Run { tasks } => run_pipeline(&db, &cfg, tasks).await?,
            CliCommand::Status { id } => run_status(&db, id).await?,
            CliCommand::Cancel { id } => run_cancel(&db, id).await?,
            CliCommand::Remove { id } => run_remove(&db, id).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
