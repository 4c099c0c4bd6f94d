//! Script-to-timeline builder.
//!
//! An authored script is an ordered list of shots plus narration segments at
//! absolute times. Shots flow sequentially on the video track; narration is
//! placed verbatim where the author put it, independent of video placement.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clip::{AudioClip, AudioRole, SourceWindow, TimelineError, VideoClip};
use crate::timeline::{Timeline, Track};

/// Clip id reserved for the music placeholder inserted by the builder.
pub const MUSIC_CLIP_ID: &str = "music";

/// An authored script: the input to `build`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Display title.
    #[serde(default)]
    pub title: String,

    /// Ordered shots placed sequentially on the video track.
    pub shots: Vec<Shot>,

    /// Narration segments at absolute timeline positions.
    #[serde(default)]
    pub narration: Vec<NarrationSegment>,

    /// Background music brief, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<MusicBrief>,
}

/// One authored shot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    /// Asset id the shot resolves to at render time.
    pub id: String,

    /// Where the shot's picture comes from.
    #[serde(flatten)]
    pub source: ShotSource,
}

/// Where a shot's rendered duration comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ShotSource {
    /// A generated or cinematic shot with a fixed rendered duration.
    Generated { duration_secs: f64 },

    /// A window cut out of a longer source recording.
    Extracted {
        source_start_secs: f64,
        source_end_secs: f64,
    },
}

impl Shot {
    /// Rendered duration: fixed for generated shots, window length for
    /// extracted shots.
    pub fn rendered_duration_secs(&self) -> f64 {
        match &self.source {
            ShotSource::Generated { duration_secs } => *duration_secs,
            ShotSource::Extracted {
                source_start_secs,
                source_end_secs,
            } => source_end_secs - source_start_secs,
        }
    }
}

/// One authored narration segment with absolute placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationSegment {
    /// Reference to the generated speech asset.
    pub source_id: String,

    /// Spoken text.
    #[serde(default)]
    pub text: String,

    pub start_secs: f64,
    pub end_secs: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Background music request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicBrief {
    /// Reference to the generated music asset (known up front even though the
    /// audio itself may not be rendered yet).
    pub source_id: String,

    /// Target length of the piece; corrected via `with_clip_duration` once
    /// the real asset exists.
    pub target_duration_secs: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in_secs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_secs: Option<f64>,
}

impl Script {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, TimelineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a script from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TimelineError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TimelineError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&json)
    }
}

/// Build a timeline from an authored script.
///
/// Shots are placed at the running cumulative sum of rendered durations.
/// Narration keeps its authored absolute times. A music brief becomes a
/// placeholder clip at `start = 0` spanning the target length.
pub fn build(script: &Script) -> Result<Timeline, TimelineError> {
    let mut video_clips = Vec::with_capacity(script.shots.len());
    let mut cursor = 0.0f64;
    for (index, shot) in script.shots.iter().enumerate() {
        let duration = shot.rendered_duration_secs();
        let clip = VideoClip::new(format!("shot-{index}"), &shot.id, cursor, duration)?;
        let clip = match &shot.source {
            ShotSource::Generated { .. } => clip,
            ShotSource::Extracted {
                source_start_secs,
                source_end_secs,
            } => clip.with_trim(SourceWindow {
                start_secs: *source_start_secs,
                end_secs: *source_end_secs,
            })?,
        };
        video_clips.push(clip);
        cursor += duration;
    }

    let mut audio_clips = Vec::new();
    for (index, segment) in script.narration.iter().enumerate() {
        audio_clips.push(AudioClip::new(
            format!("narration-{index}"),
            segment.start_secs,
            segment.end_secs - segment.start_secs,
            AudioRole::Narration {
                source_id: segment.source_id.clone(),
                text: segment.text.clone(),
                volume: segment.volume,
            },
        )?);
    }

    if let Some(brief) = &script.music {
        audio_clips.push(AudioClip::new(
            MUSIC_CLIP_ID,
            0.0,
            brief.target_duration_secs,
            AudioRole::Music {
                source_id: brief.source_id.clone(),
                volume: brief.volume,
                fade_in_secs: brief.fade_in_secs,
                fade_out_secs: brief.fade_out_secs,
            },
        )?);
    }

    Timeline::new(vec![Track::video(video_clips), Track::audio(audio_clips)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script() -> Script {
        Script {
            title: "Launch promo".to_string(),
            shots: vec![
                Shot {
                    id: "hero".to_string(),
                    source: ShotSource::Generated { duration_secs: 4.0 },
                },
                Shot {
                    id: "demo".to_string(),
                    source: ShotSource::Extracted {
                        source_start_secs: 12.0,
                        source_end_secs: 18.0,
                    },
                },
                Shot {
                    id: "logo".to_string(),
                    source: ShotSource::Generated { duration_secs: 2.5 },
                },
            ],
            narration: vec![NarrationSegment {
                source_id: "speech-intro".to_string(),
                text: "Meet the product".to_string(),
                start_secs: 1.0,
                end_secs: 4.5,
                volume: None,
            }],
            music: Some(MusicBrief {
                source_id: "music-main".to_string(),
                target_duration_secs: 12.5,
                volume: None,
                fade_in_secs: None,
                fade_out_secs: Some(1.5),
            }),
        }
    }

    #[test]
    fn shots_are_placed_at_cumulative_offsets() {
        let timeline = build(&script()).unwrap();
        let clips = timeline.video_clips();
        assert_eq!(clips.len(), 3);
        assert!((clips[0].start_secs - 0.0).abs() < 1e-9);
        assert!((clips[1].start_secs - 4.0).abs() < 1e-9);
        assert!((clips[2].start_secs - 10.0).abs() < 1e-9);
        assert!((clips[2].end_secs() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn extracted_shot_duration_is_window_length() {
        let timeline = build(&script()).unwrap();
        let clips = timeline.video_clips();
        assert!((clips[1].duration_secs - 6.0).abs() < 1e-9);
        let trim = clips[1].trim.unwrap();
        assert!((trim.start_secs - 12.0).abs() < 1e-9);
        assert!((trim.end_secs - 18.0).abs() < 1e-9);
    }

    #[test]
    fn narration_keeps_authored_absolute_times() {
        let timeline = build(&script()).unwrap();
        let narration = timeline.narration_clips();
        assert_eq!(narration.len(), 1);
        assert!((narration[0].start_secs - 1.0).abs() < 1e-9);
        assert!((narration[0].duration_secs - 3.5).abs() < 1e-9);
    }

    #[test]
    fn music_brief_becomes_placeholder_at_zero() {
        let timeline = build(&script()).unwrap();
        let music = timeline.music_clip().unwrap();
        assert_eq!(music.id, MUSIC_CLIP_ID);
        assert!((music.start_secs - 0.0).abs() < 1e-9);
        assert!((music.duration_secs - 12.5).abs() < 1e-9);
    }

    #[test]
    fn placeholder_correction_keeps_identity() {
        let timeline = build(&script()).unwrap();
        // The real asset came back a little shorter than the brief asked for.
        let corrected = timeline.with_clip_duration(MUSIC_CLIP_ID, 11.8).unwrap();
        let music = corrected.music_clip().unwrap();
        assert_eq!(music.id, MUSIC_CLIP_ID);
        assert_eq!(music.role.source_id(), "music-main");
        assert!((music.duration_secs - 11.8).abs() < 1e-9);
    }

    #[test]
    fn script_without_music_builds_no_music_clip() {
        let mut s = script();
        s.music = None;
        let timeline = build(&s).unwrap();
        assert!(timeline.music_clip().is_none());
    }

    #[test]
    fn script_round_trips_through_json() {
        let json = serde_json::to_string_pretty(&script()).unwrap();
        let parsed = Script::from_json(&json).unwrap();
        assert_eq!(parsed.shots.len(), 3);
        assert!(parsed.music.is_some());
        let rebuilt = build(&parsed).unwrap();
        assert!((rebuilt.total_duration_secs() - 12.5).abs() < 1e-9);
    }
}
