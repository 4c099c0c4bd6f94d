//! Tracks and the timeline snapshot.

use serde::{Deserialize, Serialize};

use crate::clip::{AudioClip, Clip, TimelineError, VideoClip};

/// Kind of media a track carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// An insertion-ordered set of clips of one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub kind: TrackKind,
    pub clips: Vec<Clip>,
}

impl Track {
    /// Build a video track, checking every clip matches the track kind.
    pub fn video(clips: Vec<VideoClip>) -> Self {
        Self {
            kind: TrackKind::Video,
            clips: clips.into_iter().map(Clip::Video).collect(),
        }
    }

    /// Build an audio track holding narration, music, sfx, and ambient clips
    /// interleaved by time.
    pub fn audio(clips: Vec<AudioClip>) -> Self {
        Self {
            kind: TrackKind::Audio,
            clips: clips.into_iter().map(Clip::Audio).collect(),
        }
    }

    fn validate_kinds(&self) -> Result<(), TimelineError> {
        for clip in &self.clips {
            let matches = match self.kind {
                TrackKind::Video => matches!(clip, Clip::Video(_)),
                TrackKind::Audio => matches!(clip, Clip::Audio(_)),
            };
            if !matches {
                return Err(TimelineError::KindMismatch {
                    kind: self.kind,
                    clip_id: clip.id().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Immutable snapshot of what plays when.
///
/// Every mutation returns a new `Timeline`; the aggregate duration is derived
/// on demand rather than stored, so it can never drift out of sync with the
/// clips. A timeline is discarded after an export; it is not a durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    tracks: Vec<Track>,
}

impl Timeline {
    /// Assemble a timeline, enforcing clip-id uniqueness and track/clip kind
    /// agreement.
    pub fn new(tracks: Vec<Track>) -> Result<Self, TimelineError> {
        let mut seen = std::collections::HashSet::new();
        for track in &tracks {
            track.validate_kinds()?;
            for clip in &track.clips {
                if !seen.insert(clip.id().to_string()) {
                    return Err(TimelineError::DuplicateClipId {
                        clip_id: clip.id().to_string(),
                    });
                }
            }
        }
        Ok(Self { tracks })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// `max(start + duration)` over all clips, or 0 for an empty timeline.
    pub fn total_duration_secs(&self) -> f64 {
        self.tracks
            .iter()
            .flat_map(|t| t.clips.iter())
            .map(|c| c.end_secs())
            .fold(0.0, f64::max)
    }

    /// Video clips in insertion order (the authored shot sequence).
    pub fn video_clips(&self) -> Vec<&VideoClip> {
        self.tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Video)
            .flat_map(|t| t.clips.iter())
            .filter_map(|c| match c {
                Clip::Video(v) => Some(v),
                Clip::Audio(_) => None,
            })
            .collect()
    }

    /// Narration clips sorted ascending by start time.
    pub fn narration_clips(&self) -> Vec<&AudioClip> {
        let mut clips: Vec<&AudioClip> = self
            .audio_clips()
            .into_iter()
            .filter(|c| c.role.is_narration())
            .collect();
        clips.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
        clips
    }

    /// The music clip, if the script carried a music brief.
    pub fn music_clip(&self) -> Option<&AudioClip> {
        self.audio_clips().into_iter().find(|c| c.role.is_music())
    }

    fn audio_clips(&self) -> Vec<&AudioClip> {
        self.tracks
            .iter()
            .filter(|t| t.kind == TrackKind::Audio)
            .flat_map(|t| t.clips.iter())
            .filter_map(|c| match c {
                Clip::Audio(a) => Some(a),
                Clip::Video(_) => None,
            })
            .collect()
    }

    /// New snapshot with one clip's duration corrected (the true length of a
    /// generated asset becomes known only after generation completes).
    pub fn with_clip_duration(
        &self,
        clip_id: &str,
        duration_secs: f64,
    ) -> Result<Self, TimelineError> {
        self.map_clip(clip_id, |clip| match clip {
            Clip::Video(v) => v.duration_secs = duration_secs,
            Clip::Audio(a) => a.duration_secs = duration_secs,
        })
    }

    /// New snapshot with one clip repositioned.
    pub fn with_clip_start(&self, clip_id: &str, start_secs: f64) -> Result<Self, TimelineError> {
        self.map_clip(clip_id, |clip| match clip {
            Clip::Video(v) => v.start_secs = start_secs,
            Clip::Audio(a) => a.start_secs = start_secs,
        })
    }

    fn map_clip(
        &self,
        clip_id: &str,
        update: impl FnOnce(&mut Clip),
    ) -> Result<Self, TimelineError> {
        let mut next = self.clone();
        let clip = next
            .tracks
            .iter_mut()
            .flat_map(|t| t.clips.iter_mut())
            .find(|c| c.id() == clip_id)
            .ok_or_else(|| TimelineError::UnknownClip {
                clip_id: clip_id.to_string(),
            })?;

        update(clip);

        // Re-run the construction contract on the touched clip.
        let (start, duration) = (clip.start_secs(), clip.duration_secs());
        if !start.is_finite() || start < 0.0 || !duration.is_finite() || duration <= 0.0 {
            return Err(TimelineError::InvalidClip {
                clip_id: clip_id.to_string(),
                message: format!("update produced invalid interval [{start}, +{duration})"),
            });
        }

        Ok(next)
    }
}
