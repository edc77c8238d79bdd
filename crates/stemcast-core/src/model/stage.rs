//! Stem task lifecycle stages.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of one stem task. Transitions advance strictly
/// `Queued → Separating → Rendering → Uploading → AddingToPlaylist → Done`,
/// with `Failed` reachable from any non-terminal stage. `AddingToPlaylist`
/// is skipped when the destination has no playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Queued,
    Separating,
    Rendering,
    Uploading,
    AddingToPlaylist,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Queued => "queued",
            Stage::Separating => "separating",
            Stage::Rendering => "rendering",
            Stage::Uploading => "uploading",
            Stage::AddingToPlaylist => "adding_to_playlist",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "queued" => Stage::Queued,
            "separating" => Stage::Separating,
            "rendering" => Stage::Rendering,
            "uploading" => Stage::Uploading,
            "adding_to_playlist" => Stage::AddingToPlaylist,
            "done" => Stage::Done,
            _ => Stage::Failed,
        }
    }

    /// Terminal stages end the task; no further automatic transition occurs.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed)
    }

    /// Rough percent-complete estimate for progress polling.
    /// `None` for `Failed`: the task keeps the percent it last reached.
    pub fn percent(self) -> Option<u8> {
        match self {
            Stage::Queued => Some(0),
            Stage::Separating => Some(10),
            Stage::Rendering => Some(40),
            Stage::Uploading => Some(70),
            Stage::AddingToPlaylist => Some(90),
            Stage::Done => Some(100),
            Stage::Failed => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_string_roundtrip() {
        for s in [
            Stage::Queued,
            Stage::Separating,
            Stage::Rendering,
            Stage::Uploading,
            Stage::AddingToPlaylist,
            Stage::Done,
            Stage::Failed,
        ] {
            assert_eq!(Stage::from_str(s.as_str()), s);
        }
    }

    #[test]
    fn only_done_and_failed_are_terminal() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Queued.is_terminal());
        assert!(!Stage::Uploading.is_terminal());
    }

    #[test]
    fn percent_is_monotonic_over_the_happy_path() {
        let path = [
            Stage::Queued,
            Stage::Separating,
            Stage::Rendering,
            Stage::Uploading,
            Stage::AddingToPlaylist,
            Stage::Done,
        ];
        let percents: Vec<u8> = path.iter().map(|s| s.percent().unwrap()).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(percents.last(), Some(&100));
        assert_eq!(Stage::Failed.percent(), None);
    }
}
