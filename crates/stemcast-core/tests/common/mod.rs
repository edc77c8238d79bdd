//! Scripted in-memory collaborators for integration tests.
//!
//! One `FakePipeline` backs all four collaborator traits. Every call
//! bumps a concurrency gauge on entry and drops it on exit, so tests can
//! assert how many stem tasks actually overlapped. Upload failures are
//! scripted per stem and consumed in order, which makes retry behaviour
//! deterministic without any real backoff (tests run with zero delays).

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stemcast_core::error::TaskError;
use stemcast_core::model::{
    StemAudioRef, StemType, ThumbnailSpec, TrackRef, UploadedVideoId, VideoRef,
};
use stemcast_core::pipeline::{
    Collaborators, PlaylistService, Renderer, SeparationEngine, UploadService,
};

pub struct FakePipeline {
    active: AtomicUsize,
    max_active: AtomicUsize,
    stage_delay: Duration,
    upload_errors: Mutex<HashMap<StemType, Vec<TaskError>>>,
    pub separate_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub playlist_calls: AtomicUsize,
}

impl FakePipeline {
    pub fn new() -> Arc<Self> {
        Self::with_stage_delay(Duration::ZERO)
    }

    /// A fake where every collaborator call takes `delay` wall time.
    /// Long enough delays make concurrent tasks overlap reliably.
    pub fn with_stage_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            stage_delay: delay,
            upload_errors: Mutex::new(HashMap::new()),
            separate_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            playlist_calls: AtomicUsize::new(0),
        })
    }

    /// Script the next upload attempts for `stem` to fail with the given
    /// errors, in order. Once the script runs out, uploads succeed.
    pub fn fail_uploads(&self, stem: StemType, errors: Vec<TaskError>) {
        self.upload_errors.lock().unwrap().insert(stem, errors);
    }

    /// Highest number of collaborator calls that were in flight at once.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            separation: Arc::clone(self) as Arc<dyn SeparationEngine>,
            renderer: Arc::clone(self) as Arc<dyn Renderer>,
            upload: Arc::clone(self) as Arc<dyn UploadService>,
            playlist: Arc::clone(self) as Arc<dyn PlaylistService>,
        }
    }

    fn enter(&self) -> ActiveGuard<'_> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.stage_delay.is_zero() {
            std::thread::sleep(self.stage_delay);
        }
        ActiveGuard(self)
    }
}

struct ActiveGuard<'a>(&'a FakePipeline);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SeparationEngine for FakePipeline {
    fn separate(&self, track: &TrackRef, stem: StemType) -> Result<StemAudioRef, TaskError> {
        let _g = self.enter();
        self.separate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StemAudioRef(format!("{}.{stem}.wav", track.0)))
    }
}

impl Renderer for FakePipeline {
    fn render(&self, audio: &StemAudioRef, _thumb: &ThumbnailSpec) -> Result<VideoRef, TaskError> {
        let _g = self.enter();
        Ok(VideoRef(format!("{}.mp4", audio.0)))
    }
}

impl UploadService for FakePipeline {
    fn upload(&self, video: &VideoRef, _channel: &str) -> Result<UploadedVideoId, TaskError> {
        let _g = self.enter();
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        let stem = stem_of(video);
        let mut scripted = self.upload_errors.lock().unwrap();
        if let Some(errors) = scripted.get_mut(&stem) {
            if !errors.is_empty() {
                return Err(errors.remove(0));
            }
        }
        Ok(UploadedVideoId(format!("vid-{}", video.0)))
    }
}

impl PlaylistService for FakePipeline {
    fn add_to_playlist(&self, _video: &UploadedVideoId, playlist: &str) -> Result<(), TaskError> {
        let _g = self.enter();
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        if playlist == "missing" {
            return Err(TaskError::PlaylistNotFound(playlist.to_string()));
        }
        Ok(())
    }
}

/// Recover the stem type from the `{track}.{stem}.wav.mp4` refs the fake
/// itself produced upstream.
fn stem_of(video: &VideoRef) -> StemType {
    StemType::ALL
        .iter()
        .copied()
        .find(|s| video.0.contains(&format!(".{s}.")))
        .unwrap_or(StemType::Vocals)
}
