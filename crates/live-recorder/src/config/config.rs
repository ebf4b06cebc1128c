//! Configuration management for live-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{LoggingConfig, MonitorConfig, RecordingConfig},
};

use live_recorder_core::{AnalyzerSettings, RecorderSettings};

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output target and encoder settings.
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Waveform analyzer and speech gating.
    #[serde(default)]
    pub analyzer: AnalyzerSettings,
    /// Log filter and file output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Input route monitoring.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating a default file there if absent.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            info!(config_path = ?path, "No config found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Reject values the recorder cannot run with.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        if self.recording.bitrate == 0 {
            return Err(AppError::config("recording.bitrate must be greater than zero"));
        }
        if self.recording.queue_depth == 0 {
            return Err(AppError::config(
                "recording.queue_depth must be greater than zero",
            ));
        }
        if self.recording.duration_interval_ms == 0 {
            return Err(AppError::config(
                "recording.duration_interval_ms must be greater than zero",
            ));
        }

        let normalized = self.analyzer.clone().normalized();
        if normalized != self.analyzer {
            warn!(
                configured = ?self.analyzer,
                effective = ?normalized,
                "Analyzer settings out of range, values will be clamped"
            );
        }

        Ok(())
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(config_dir = ?parent, "Created config directory");
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| AppError::config(format!("Failed to serialize config: {}", e)))?;

        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| AppError::config(format!("Failed to create temp config file: {}", e)))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::config(format!("Failed to write temp config file: {}", e)))?;

        temp_file
            .sync_all()
            .map_err(|e| AppError::config(format!("Failed to sync temp config file: {}", e)))?;

        fs::rename(&temp_path, path).map_err(|e| {
            AppError::config(format!("Failed to rename temp config to final: {}", e))
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Core recorder settings for this configuration.
    pub fn recorder_settings(&self) -> RecorderSettings {
        RecorderSettings {
            bitrate: self.recording.bitrate,
            output_dir: self.recording.output_dir.clone(),
            duration_interval_ms: self.recording.duration_interval_ms,
            queue_depth: self.recording.queue_depth,
            analyzer: self.analyzer.clone(),
        }
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("logs"))
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "live-recorder", "Live-Recorder")
            .ok_or_else(|| AppError::config("Failed to get project directories"))
    }
}
