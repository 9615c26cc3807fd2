//! tts-worker configuration management.

use crate::audio::{SilenceSpec, DEFAULT_SILENCE_SECONDS};
use crate::pipeline::PipelineSettings;
use crate::text::DEFAULT_MAX_LENGTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "TTS_WORKER_CONFIG";

/// Longest accepted gap between chunks, in seconds.
pub const MAX_SILENCE_SECONDS: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Device to use (cuda, mps, cpu). None means auto-detect.
    #[serde(default)]
    pub device: Option<String>,

    /// Voice reference used when a request brings none
    #[serde(default)]
    pub default_voice_ref: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// Silence between chunks, in seconds
    #[serde(default = "default_silence_seconds")]
    pub silence_seconds: f32,
}

fn default_max_chunk_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_silence_seconds() -> f32 {
    DEFAULT_SILENCE_SECONDS
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            device: None,
            default_voice_ref: None,
            max_chunk_length: default_max_chunk_length(),
            silence_seconds: default_silence_seconds(),
        }
    }
}

impl WorkerConfig {
    /// Get the config file path: $TTS_WORKER_CONFIG or ~/.config/tts-worker/config.toml
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("tts-worker").join("config.toml"))
    }

    /// Load config from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: WorkerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_chunk_length == 0 {
            anyhow::bail!("max_chunk_length must be at least 1");
        }
        if !(0.0..=MAX_SILENCE_SECONDS).contains(&self.silence_seconds) {
            anyhow::bail!(
                "silence_seconds must be between 0 and {} (got {})",
                MAX_SILENCE_SECONDS,
                self.silence_seconds
            );
        }
        Ok(())
    }

    /// Pipeline parameters derived from this config.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_chunk_length: self.max_chunk_length,
            silence: SilenceSpec::new(self.silence_seconds),
            default_voice_ref: self.default_voice_ref.clone(),
        }
    }
}
