//! Contracts for the external subsystems the pipeline drives.
//!
//! The core never implements these; it only calls them. All four are
//! blocking, long-running operations and are invoked on worker threads
//! (`spawn_blocking`), never while a progress store lock is held.

use std::sync::Arc;

use crate::error::TaskError;
use crate::model::{StemAudioRef, StemType, ThumbnailSpec, TrackRef, UploadedVideoId, VideoRef};

/// Extracts one stem from a mixed source track.
pub trait SeparationEngine: Send + Sync {
    fn separate(&self, track: &TrackRef, stem: StemType) -> Result<StemAudioRef, TaskError>;
}

/// Renders stem audio plus a thumbnail/intro card into a video.
pub trait Renderer: Send + Sync {
    fn render(&self, audio: &StemAudioRef, thumb: &ThumbnailSpec) -> Result<VideoRef, TaskError>;
}

/// Uploads a rendered video to a destination channel.
pub trait UploadService: Send + Sync {
    fn upload(&self, video: &VideoRef, channel: &str) -> Result<UploadedVideoId, TaskError>;
}

/// Appends an uploaded video to a playlist.
pub trait PlaylistService: Send + Sync {
    fn add_to_playlist(&self, video: &UploadedVideoId, playlist: &str) -> Result<(), TaskError>;
}

/// The full collaborator set a worker needs to drive one stem task.
#[derive(Clone)]
pub struct Collaborators {
    pub separation: Arc<dyn SeparationEngine>,
    pub renderer: Arc<dyn Renderer>,
    pub upload: Arc<dyn UploadService>,
    pub playlist: Arc<dyn PlaylistService>,
}
