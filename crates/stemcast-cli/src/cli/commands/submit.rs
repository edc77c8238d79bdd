//! `stemcast submit <track>` – validate and enqueue a new stem-split job.

use std::collections::HashMap;

use anyhow::{bail, Result};
use stemcast_core::job_db::JobDb;
use stemcast_core::model::{
    default_destination, Destination, StemType, Submission, TrackMeta, TrackRef,
};

#[derive(Debug)]
pub struct SubmitArgs {
    pub track: String,
    pub stems: Vec<String>,
    pub artist: String,
    pub title: String,
    pub bpm: u32,
    pub key: Option<String>,
    pub genre: Option<String>,
    pub channels: Vec<String>,
    pub playlists: Vec<String>,
}

pub async fn run_submit(db: &JobDb, args: SubmitArgs) -> Result<()> {
    let stems: Vec<String> = if args.stems.is_empty() {
        StemType::ALL.iter().map(|s| s.as_str().to_string()).collect()
    } else {
        args.stems
    };

    // Default channel routing per stem; --channel and --playlist override.
    let mut destinations: HashMap<String, Destination> = stems
        .iter()
        .filter_map(|name| {
            let stem = StemType::parse(name)?;
            Some((name.clone(), default_destination(stem)))
        })
        .collect();

    for pair in &args.channels {
        let (stem, channel) = split_pair(pair, "--channel")?;
        destinations
            .entry(stem.to_string())
            .and_modify(|d| d.channel = channel.to_string())
            .or_insert_with(|| Destination {
                channel: channel.to_string(),
                playlist: None,
            });
    }
    for pair in &args.playlists {
        let (stem, playlist) = split_pair(pair, "--playlist")?;
        match destinations.get_mut(stem) {
            Some(d) => d.playlist = Some(playlist.to_string()),
            None => bail!("--playlist {pair}: stem {stem:?} is not part of this submission"),
        }
    }

    let submission = Submission {
        source_track: TrackRef(args.track.clone()),
        stems,
        destinations,
        meta: TrackMeta {
            artist: args.artist,
            title: args.title,
            bpm: args.bpm,
            key: args.key,
            genre: args.genre,
        },
    };

    let spec = submission.validate()?;
    let id = db.add_job(&spec).await?;

    println!("Added job {id}: {} stem(s) of {}", spec.stems.len(), args.track);
    for stem in &spec.stems {
        println!("  {:<12} -> {}", stem.to_string(), spec.destinations[stem].channel);
    }
    Ok(())
}

fn split_pair<'a>(pair: &'a str, flag: &str) -> Result<(&'a str, &'a str)> {
    match pair.split_once('=') {
        Some((stem, value)) if !stem.is_empty() && !value.is_empty() => Ok((stem, value)),
        _ => bail!("{flag} expects STEM=VALUE, got {pair:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::split_pair;

    #[test]
    fn split_pair_accepts_stem_value() {
        assert_eq!(
            split_pair("drums=Son Got Drums", "--channel").unwrap(),
            ("drums", "Son Got Drums")
        );
    }

    #[test]
    fn split_pair_rejects_missing_value() {
        assert!(split_pair("drums=", "--channel").is_err());
        assert!(split_pair("drums", "--channel").is_err());
        assert!(split_pair("=x", "--channel").is_err());
    }
}
