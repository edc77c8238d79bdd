//! Stem type vocabulary.

use serde::{Deserialize, Serialize};

/// An isolated component track extracted from a mixed source.
///
/// Vocals keep the user-facing label "Acapella" for consistency with the
/// destination channels, but the canonical key stays `vocals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemType {
    Vocals,
    Drums,
    Bass,
    Instrumental,
    Melody,
}

impl StemType {
    pub const ALL: [StemType; 5] = [
        StemType::Vocals,
        StemType::Drums,
        StemType::Bass,
        StemType::Instrumental,
        StemType::Melody,
    ];

    /// Canonical key used for routing and persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            StemType::Vocals => "vocals",
            StemType::Drums => "drums",
            StemType::Bass => "bass",
            StemType::Instrumental => "instrumental",
            StemType::Melody => "melody",
        }
    }

    /// User-facing label (title case; vocals are branded as "Acapella").
    pub fn label(self) -> &'static str {
        match self {
            StemType::Vocals => "Acapella",
            StemType::Drums => "Drums",
            StemType::Bass => "Bass",
            StemType::Instrumental => "Instrumental",
            StemType::Melody => "Melody",
        }
    }

    /// Parse a stem name. Accepts the `acapella` alias for vocals.
    /// Returns `None` for unknown stem types so submissions can be rejected.
    pub fn parse(s: &str) -> Option<StemType> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocals" | "vocal" | "acapella" => Some(StemType::Vocals),
            "drums" | "drum" => Some(StemType::Drums),
            "bass" => Some(StemType::Bass),
            "instrumental" | "other" => Some(StemType::Instrumental),
            "melody" => Some(StemType::Melody),
            _ => None,
        }
    }
}

impl std::fmt::Display for StemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
