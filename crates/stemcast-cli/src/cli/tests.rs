//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> CliCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    cli.command
}

#[test]
fn cli_parse_submit_minimal() {
    match parse(&[
        "stemcast",
        "submit",
        "track.mp3",
        "--artist",
        "Mos Def",
        "--title",
        "Mathematics",
    ]) {
        CliCommand::Submit {
            track,
            stems,
            artist,
            title,
            bpm,
            key,
            ..
        } => {
            assert_eq!(track, "track.mp3");
            assert!(stems.is_empty());
            assert_eq!(artist, "Mos Def");
            assert_eq!(title, "Mathematics");
            assert_eq!(bpm, 0);
            assert!(key.is_none());
        }
        _ => panic!("expected Submit"),
    }
}

#[test]
fn cli_parse_submit_full() {
    match parse(&[
        "stemcast",
        "submit",
        "track.mp3",
        "--stem",
        "vocals",
        "--stem",
        "drums",
        "--artist",
        "Mos Def",
        "--title",
        "Mathematics",
        "--bpm",
        "91",
        "--key",
        "F min",
        "--channel",
        "drums=My Drums",
        "--playlist",
        "vocals=Best Acapellas",
    ]) {
        CliCommand::Submit {
            stems,
            bpm,
            key,
            channels,
            playlists,
            ..
        } => {
            assert_eq!(stems, vec!["vocals", "drums"]);
            assert_eq!(bpm, 91);
            assert_eq!(key.as_deref(), Some("F min"));
            assert_eq!(channels, vec!["drums=My Drums"]);
            assert_eq!(playlists, vec!["vocals=Best Acapellas"]);
        }
        _ => panic!("expected Submit"),
    }
}

#[test]
fn cli_parse_submit_requires_artist_and_title() {
    assert!(Cli::try_parse_from(["stemcast", "submit", "track.mp3"]).is_err());
}

#[test]
fn cli_parse_run() {
    match parse(&["stemcast", "run"]) {
        CliCommand::Run { tasks } => assert!(tasks.is_none()),
        _ => panic!("expected Run"),
    }
    match parse(&["stemcast", "run", "--tasks", "8"]) {
        CliCommand::Run { tasks } => assert_eq!(tasks, Some(8)),
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_status() {
    match parse(&["stemcast", "status"]) {
        CliCommand::Status { id } => assert!(id.is_none()),
        _ => panic!("expected Status"),
    }
    match parse(&["stemcast", "status", "7"]) {
        CliCommand::Status { id } => assert_eq!(id, Some(7)),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_cancel() {
    match parse(&["stemcast", "cancel", "42"]) {
        CliCommand::Cancel { id } => assert_eq!(id, 42),
        _ => panic!("expected Cancel"),
    }
}

#[test]
fn cli_parse_remove() {
    match parse(&["stemcast", "remove", "99"]) {
        CliCommand::Remove { id } => assert_eq!(id, 99),
        _ => panic!("expected Remove"),
    }
}
