//! Clip types placed on timeline tracks.
//!
//! A clip is a single positioned interval referencing one externally
//! generated media asset. Start time and duration are validated at
//! construction; `end_secs` is always derived, never stored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Errors raised while constructing or mutating timeline structures.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    #[error("Invalid clip '{clip_id}': {message}")]
    InvalidClip { clip_id: String, message: String },

    #[error("Duplicate clip id '{clip_id}' in timeline")]
    DuplicateClipId { clip_id: String },

    #[error("No clip with id '{clip_id}' in timeline")]
    UnknownClip { clip_id: String },

    #[error("Track of kind {kind:?} cannot hold clip '{clip_id}'")]
    KindMismatch {
        kind: crate::timeline::TrackKind,
        clip_id: String,
    },

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in script: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A window `[start, end)` into a longer source asset, in source seconds.
///
/// Present on clips extracted from a longer recording; absent on clips that
/// are themselves complete rendered assets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceWindow {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl SourceWindow {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// A video clip referencing one generated shot asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoClip {
    /// Unique clip id within the timeline.
    pub id: String,

    /// Reference to the externally generated still/video asset.
    pub shot_id: String,

    /// Absolute timeline position, seconds.
    pub start_secs: f64,

    /// Clip length, seconds.
    pub duration_secs: f64,

    /// Source window for clips cut out of a longer asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<SourceWindow>,
}

impl VideoClip {
    pub fn new(
        id: impl Into<String>,
        shot_id: impl Into<String>,
        start_secs: f64,
        duration_secs: f64,
    ) -> Result<Self, TimelineError> {
        let id = id.into();
        validate_interval(&id, start_secs, duration_secs)?;
        Ok(Self {
            id,
            shot_id: shot_id.into(),
            start_secs,
            duration_secs,
            trim: None,
        })
    }

    /// Attach a source window. The clip duration must match the window.
    pub fn with_trim(mut self, window: SourceWindow) -> Result<Self, TimelineError> {
        if !window.start_secs.is_finite()
            || !window.end_secs.is_finite()
            || window.start_secs < 0.0
            || window.duration_secs() <= 0.0
        {
            return Err(TimelineError::InvalidClip {
                clip_id: self.id,
                message: format!(
                    "source window [{}, {}) is not a positive interval",
                    window.start_secs, window.end_secs
                ),
            });
        }
        self.trim = Some(window);
        Ok(self)
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Role of an audio clip on the audio track.
///
/// Narration, music, sfx, and ambient clips share one track, interleaved by
/// time rather than split across separate tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "audio_type", rename_all = "lowercase")]
pub enum AudioRole {
    Narration {
        /// Reference to the generated speech asset.
        source_id: String,
        /// Spoken text, kept for display and diagnostics.
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
    },
    Music {
        source_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fade_in_secs: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fade_out_secs: Option<f64>,
    },
    Sfx {
        source_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
    },
    Ambient {
        source_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<f64>,
    },
}

impl AudioRole {
    /// The generated asset this clip plays.
    pub fn source_id(&self) -> &str {
        match self {
            AudioRole::Narration { source_id, .. }
            | AudioRole::Music { source_id, .. }
            | AudioRole::Sfx { source_id, .. }
            | AudioRole::Ambient { source_id, .. } => source_id,
        }
    }

    pub fn is_narration(&self) -> bool {
        matches!(self, AudioRole::Narration { .. })
    }

    pub fn is_music(&self) -> bool {
        matches!(self, AudioRole::Music { .. })
    }
}

/// An audio clip referencing one generated audio asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioClip {
    /// Unique clip id within the timeline.
    pub id: String,

    /// Absolute timeline position, seconds.
    pub start_secs: f64,

    /// Clip length, seconds.
    pub duration_secs: f64,

    /// What the clip plays and how it is mixed.
    #[serde(flatten)]
    pub role: AudioRole,
}

impl AudioClip {
    pub fn new(
        id: impl Into<String>,
        start_secs: f64,
        duration_secs: f64,
        role: AudioRole,
    ) -> Result<Self, TimelineError> {
        let id = id.into();
        validate_interval(&id, start_secs, duration_secs)?;
        Ok(Self {
            id,
            start_secs,
            duration_secs,
            role,
        })
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Any clip placeable on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Clip {
    Video(VideoClip),
    Audio(AudioClip),
}

impl Clip {
    pub fn id(&self) -> &str {
        match self {
            Clip::Video(c) => &c.id,
            Clip::Audio(c) => &c.id,
        }
    }

    pub fn start_secs(&self) -> f64 {
        match self {
            Clip::Video(c) => c.start_secs,
            Clip::Audio(c) => c.start_secs,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        match self {
            Clip::Video(c) => c.duration_secs,
            Clip::Audio(c) => c.duration_secs,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs() + self.duration_secs()
    }
}

/// Contract check shared by all clip constructors: negative, NaN, or
/// zero-length intervals are construction-time errors, never recovered.
fn validate_interval(id: &str, start_secs: f64, duration_secs: f64) -> Result<(), TimelineError> {
    if !start_secs.is_finite() || start_secs < 0.0 {
        return Err(TimelineError::InvalidClip {
            clip_id: id.to_string(),
            message: format!("start {start_secs} must be finite and >= 0"),
        });
    }
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(TimelineError::InvalidClip {
            clip_id: id.to_string(),
            message: format!("duration {duration_secs} must be finite and > 0"),
        });
    }
    Ok(())
}
