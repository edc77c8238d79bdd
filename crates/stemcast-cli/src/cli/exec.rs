//! Collaborator adapters that shell out to configured command templates.
//!
//! Each pipeline stage maps to one template from the `[commands]` config
//! section. Placeholders are substituted with shell-quoted values and the
//! result runs under `sh -c`. A stage's output reference (stem audio path,
//! video path, uploaded video id) is the command's trimmed stdout.

use std::process::{Command, Stdio};
use std::sync::Arc;

use stemcast_core::config::CommandsConfig;
use stemcast_core::error::TaskError;
use stemcast_core::model::{StemAudioRef, StemType, ThumbnailSpec, TrackRef, UploadedVideoId, VideoRef};
use stemcast_core::pipeline::{
    Collaborators, PlaylistService, Renderer, SeparationEngine, UploadService,
};

pub struct CommandPipeline {
    commands: CommandsConfig,
}

impl CommandPipeline {
    pub fn new(commands: CommandsConfig) -> Arc<Self> {
        Arc::new(Self { commands })
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            separation: Arc::clone(self) as Arc<dyn SeparationEngine>,
            renderer: Arc::clone(self) as Arc<dyn Renderer>,
            upload: Arc::clone(self) as Arc<dyn UploadService>,
            playlist: Arc::clone(self) as Arc<dyn PlaylistService>,
        }
    }
}

/// Substitute `{name}` placeholders with shell-quoted values.
fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{name}}}"), &shell_quote(value));
    }
    out
}

/// Single-quote a value for `sh -c`, escaping embedded single quotes.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Run a rendered command line and return its trimmed stdout.
fn run_command(cmdline: &str, stage: &str) -> Result<String, TaskError> {
    tracing::debug!(stage, "running: {cmdline}");
    let output = Command::new("sh")
        .arg("-c")
        .arg(cmdline)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| TaskError::Transient(format!("failed to spawn {stage} command: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(
            stage,
            output.status.code(),
            stderr.trim(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Best-effort mapping of a command failure onto the task error taxonomy,
/// keyed on well-known markers in stderr.
fn classify_failure(stage: &str, code: Option<i32>, stderr: &str) -> TaskError {
    let lower = stderr.to_lowercase();
    let detail = format!("{stage} command exited with {code:?}: {stderr}");
    if lower.contains("quota") || lower.contains("rate limit") {
        TaskError::Quota(detail)
    } else if lower.contains("unauthorized") || lower.contains("invalid_grant") || lower.contains("forbidden") {
        TaskError::Auth(detail)
    } else {
        match stage {
            "separate" => TaskError::Separation(detail),
            "render" => TaskError::Render(detail),
            _ => TaskError::Transient(detail),
        }
    }
}

fn require_output(stdout: String, stage: &str) -> Result<String, TaskError> {
    if stdout.is_empty() {
        return Err(TaskError::Transient(format!(
            "{stage} command produced no output reference on stdout"
        )));
    }
    Ok(stdout)
}

impl SeparationEngine for CommandPipeline {
    fn separate(&self, track: &TrackRef, stem: StemType) -> Result<StemAudioRef, TaskError> {
        let cmdline = render_template(
            &self.commands.separate,
            &[("track", &track.0), ("stem", stem.as_str())],
        );
        let out = run_command(&cmdline, "separate")?;
        Ok(StemAudioRef(require_output(out, "separate")?))
    }
}

impl Renderer for CommandPipeline {
    fn render(&self, audio: &StemAudioRef, thumb: &ThumbnailSpec) -> Result<VideoRef, TaskError> {
        let cmdline = render_template(
            &self.commands.render,
            &[
                ("audio", &audio.0),
                ("title", &thumb.title),
                ("channel", &thumb.channel),
                ("stem", &thumb.stem_label),
            ],
        );
        let out = run_command(&cmdline, "render")?;
        Ok(VideoRef(require_output(out, "render")?))
    }
}

impl UploadService for CommandPipeline {
    fn upload(&self, video: &VideoRef, channel: &str) -> Result<UploadedVideoId, TaskError> {
        let cmdline = render_template(
            &self.commands.upload,
            &[("video", &video.0), ("channel", channel)],
        );
        let out = run_command(&cmdline, "upload")?;
        Ok(UploadedVideoId(require_output(out, "upload")?))
    }
}

impl PlaylistService for CommandPipeline {
    fn add_to_playlist(&self, video: &UploadedVideoId, playlist: &str) -> Result<(), TaskError> {
        let Some(template) = &self.commands.playlist else {
            return Err(TaskError::PlaylistNotFound(
                "no playlist command template configured".to_string(),
            ));
        };
        let cmdline = render_template(
            template,
            &[("video", &video.0), ("playlist", playlist)],
        );
        run_command(&cmdline, "playlist")?;
        Ok(())
    }
}
