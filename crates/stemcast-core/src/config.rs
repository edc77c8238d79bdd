use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per stage (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Base delay in seconds for quota errors (longer; the destination API
    /// window is operationally tunable).
    pub quota_delay_secs: u64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            quota_delay_secs: 30,
            max_delay_secs: 60,
        }
    }
}

/// External command templates used by the CLI collaborator adapters.
/// Placeholders: `{track}`, `{stem}`, `{audio}`, `{title}`, `{channel}`,
/// `{video}`, `{playlist}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    pub separate: String,
    pub render: String,
    pub upload: String,
    #[serde(default)]
    pub playlist: Option<String>,
}

/// Global configuration loaded from `~/.config/stemcast/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StemcastConfig {
    /// Maximum stem tasks executing concurrently across all jobs
    /// (protects downstream services and API rate limits).
    pub max_concurrent_tasks: usize,
    /// Maximum stem tasks of a single job executing concurrently
    /// (prevents one large job from starving others).
    pub max_tasks_per_job: usize,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional external command templates for the CLI pipeline.
    #[serde(default)]
    pub commands: Option<CommandsConfig>,
}

impl Default for StemcastConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 4,
            max_tasks_per_job: 4,
            retry: None,
            commands: None,
        }
    }
}

impl StemcastConfig {
    /// Retry policy from the `[retry]` section, or built-in defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(|r| RetryPolicy {
                max_attempts: r.max_attempts,
                base_delay: Duration::from_secs_f64(r.base_delay_secs),
                quota_delay: Duration::from_secs(r.quota_delay_secs),
                max_delay: Duration::from_secs(r.max_delay_secs),
            })
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("stemcast")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<StemcastConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = StemcastConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: StemcastConfig = toml::from_str(&data)?;
    Ok(cfg)
}
