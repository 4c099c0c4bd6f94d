//! Error types shared across Reelsmith crates.

use std::path::PathBuf;

/// Top-level error type for Reelsmith operations.
#[derive(Debug, thiserror::Error)]
pub enum ReelsmithError {
    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Missing asset: no generated media found for id '{asset_id}'")]
    MissingAsset { asset_id: String },

    #[error("Transcode error in stage '{stage}': {message}")]
    Transcode { stage: String, message: String },

    #[error("Stage '{stage}' exceeded its {budget_secs}s wall-clock budget")]
    Timeout { stage: String, budget_secs: u64 },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ReelsmithError.
pub type ReelsmithResult<T> = Result<T, ReelsmithError>;

impl ReelsmithError {
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn missing_asset(asset_id: impl Into<String>) -> Self {
        Self::MissingAsset {
            asset_id: asset_id.into(),
        }
    }

    pub fn transcode(stage: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transcode {
            stage: stage.into(),
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}
