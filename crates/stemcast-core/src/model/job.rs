//! Job submissions, destinations, and opaque media handles.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::OrchestratorError;

use super::StemType;

/// Job identifier, assigned by the job database at submission.
pub type JobId = i64;

/// Opaque handle to the uploaded source track. The core never inspects it;
/// collaborators decide whether it is a path, URL, or storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef(pub String);

/// Opaque handle to a separated stem audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StemAudioRef(pub String);

/// Opaque handle to a rendered stem video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef(pub String);

/// Identifier of an uploaded video on the destination platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedVideoId(pub String);

impl std::fmt::Display for UploadedVideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where one stem's video goes: a destination channel, optionally with a
/// playlist the video is appended to after upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub channel: String,
    #[serde(default)]
    pub playlist: Option<String>,
}

/// Track metadata carried through the pipeline and into video titles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMeta {
    pub artist: String,
    pub title: String,
    #[serde(default)]
    pub bpm: u32,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

impl TrackMeta {
    /// Video title for one stem: `Artist - Title Stem [BPM BPM_Key]`.
    /// Drum videos omit the key since it carries no meaning for them.
    pub fn video_title(&self, stem: StemType) -> String {
        let key = self.key.as_deref().unwrap_or("?");
        match stem {
            StemType::Drums => format!(
                "{} - {} {} [{} BPM]",
                self.artist,
                self.title,
                stem.label(),
                self.bpm
            ),
            _ => format!(
                "{} - {} {} [{} BPM_{}]",
                self.artist,
                self.title,
                stem.label(),
                self.bpm,
                key
            ),
        }
    }
}

/// Inputs the renderer needs to composite the thumbnail/intro card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    pub title: String,
    pub channel: String,
    pub stem_label: String,
}

/// Raw submission as received from the service layer. Stem names and
/// destination keys are free-form strings here; `validate` turns them into
/// a typed [`JobSpec`] or rejects the whole request.
#[derive(Debug, Clone)]
pub struct Submission {
    pub source_track: TrackRef,
    pub stems: Vec<String>,
    pub destinations: HashMap<String, Destination>,
    pub meta: TrackMeta,
}

impl Submission {
    /// Validate the submission: the stem set must be non-empty, every name
    /// must be a known stem type (duplicates collapse), and every requested
    /// stem must have a destination. No job is created when this fails.
    pub fn validate(self) -> Result<JobSpec, OrchestratorError> {
        if self.stems.is_empty() {
            return Err(OrchestratorError::InvalidRequest(
                "requested stem set is empty".to_string(),
            ));
        }

        let mut stems = BTreeSet::new();
        for name in &self.stems {
            let stem = StemType::parse(name).ok_or_else(|| {
                OrchestratorError::InvalidRequest(format!("unknown stem type: {name:?}"))
            })?;
            stems.insert(stem);
        }

        let mut destinations = BTreeMap::new();
        for (name, dest) in &self.destinations {
            let stem = StemType::parse(name).ok_or_else(|| {
                OrchestratorError::InvalidRequest(format!(
                    "destination for unknown stem type: {name:?}"
                ))
            })?;
            destinations.insert(stem, dest.clone());
        }

        for stem in &stems {
            if !destinations.contains_key(stem) {
                return Err(OrchestratorError::InvalidRequest(format!(
                    "no destination configured for stem {stem}"
                )));
            }
        }
        destinations.retain(|stem, _| stems.contains(stem));

        Ok(JobSpec {
            source_track: self.source_track,
            stems,
            destinations,
            meta: self.meta,
        })
    }
}

/// Validated job description: what to separate and where each stem goes.
/// Serialized as JSON into the job row so jobs survive a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub source_track: TrackRef,
    pub stems: BTreeSet<StemType>,
    pub destinations: BTreeMap<StemType, Destination>,
    pub meta: TrackMeta,
}

impl JobSpec {
    pub fn thumbnail_spec(&self, stem: StemType) -> ThumbnailSpec {
        let channel = self
            .destinations
            .get(&stem)
            .map(|d| d.channel.clone())
            .unwrap_or_default();
        ThumbnailSpec {
            title: self.meta.video_title(stem),
            channel,
            stem_label: stem.label().to_string(),
        }
    }
}

/// Default destination channel for a stem, mirroring the routing the
/// destination channels were set up with. Callers can override per
/// submission; playlists are never defaulted.
pub fn default_destination(stem: StemType) -> Destination {
    let channel = match stem {
        StemType::Vocals => "Son Got Acapellas",
        StemType::Drums => "Son Got Drums",
        StemType::Bass | StemType::Instrumental | StemType::Melody => "Sample Split",
    };
    Destination {
        channel: channel.to_string(),
        playlist: None,
    }
}
