//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default render settings.
    pub render: RenderConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Render parameters shared by every export stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Canonical output resolution every source clip is normalized to.
    pub width: u32,
    pub height: u32,

    /// Canonical output frame rate.
    pub fps: u32,

    /// Video codec used when normalizing clips (concatenation is a stream copy).
    pub video_codec: String,

    /// x264/x265 CRF quality for the normalization pass.
    pub crf: u32,

    /// Audio sample rate for all rendered audio tracks.
    pub audio_sample_rate: u32,

    /// Audio bitrate in kbps for the final mux.
    pub audio_bitrate_kbps: u32,

    /// Integrated loudness target (LUFS) for narration normalization.
    pub loudness_target_lufs: f64,

    /// True-peak ceiling (dBTP) for narration normalization.
    pub loudness_true_peak_db: f64,

    /// Wall-clock budget per pipeline stage, in seconds.
    pub stage_timeout_secs: u64,

    /// Default music ducking parameters.
    pub ducking: DuckingConfig,
}

/// Music ducking parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DuckingConfig {
    /// Whether music is ducked under narration at all.
    pub enabled: bool,

    /// Music volume outside narration windows.
    pub normal_volume: f64,

    /// Music volume while narration is playing.
    pub ducked_volume: f64,

    /// Length of each fade ramp, in seconds.
    pub fade_secs: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reelsmith=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            video_codec: "libx264".to_string(),
            crf: 18,
            audio_sample_rate: 48000,
            audio_bitrate_kbps: 192,
            loudness_target_lufs: -16.0,
            loudness_true_peak_db: -1.5,
            stage_timeout_secs: 300,
            ducking: DuckingConfig::default(),
        }
    }
}

impl Default for DuckingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            normal_volume: 0.3,
            ducked_volume: 0.15,
            fade_secs: 0.5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("reelsmith").join("config.json")
}
