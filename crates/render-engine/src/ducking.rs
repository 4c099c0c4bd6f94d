//! Music ducking automation.
//!
//! Compiles narration activity into a deterministic volume-over-time curve
//! for the music track: fade down just before each narration clip starts,
//! hold the ducked level while it plays, fade back up when it ends.
//!
//! The curve is an ordered list of time windows. Windows are recorded in
//! ascending narration order and evaluated in reverse insertion order, so
//! when consecutive clips sit closer together than two fade lengths the
//! later clip's windows win inside the overlap. The same precedence holds in
//! the serialized ffmpeg expression, where later windows wrap earlier ones.

use reelsmith_common::config::DuckingConfig;
use reelsmith_timeline_model::clip::AudioClip;

/// Fade-down begins this far ahead of the narration start so the level has
/// already settled when speech begins (avoids an audible pop).
pub const DUCK_LOOKAHEAD_SECS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowShape {
    /// Linear ramp from `from` at the window start to `to` at the window end.
    Ramp { from: f64, to: f64 },
    /// Constant level across the window.
    Hold { level: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VolumeWindow {
    /// Half-open interval `[start, end)` in timeline seconds.
    start_secs: f64,
    end_secs: f64,
    shape: WindowShape,
}

impl VolumeWindow {
    fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t < self.end_secs
    }

    fn value_at(&self, t: f64) -> f64 {
        match self.shape {
            WindowShape::Hold { level } => level,
            WindowShape::Ramp { from, to } => {
                let span = self.end_secs - self.start_secs;
                let progress = ((t - self.start_secs) / span).clamp(0.0, 1.0);
                from + (to - from) * progress
            }
        }
    }
}

/// A compiled volume-over-time function `V(t)` for the music track.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCurve {
    normal_volume: f64,
    windows: Vec<VolumeWindow>,
}

impl VolumeCurve {
    /// A curve that is `volume` everywhere.
    pub fn constant(volume: f64) -> Self {
        Self {
            normal_volume: volume,
            windows: Vec::new(),
        }
    }

    /// Compile narration activity into a ducking curve.
    ///
    /// `narration` must be sorted ascending by start time (the timeline
    /// accessor guarantees this). Disabled ducking or an empty narration set
    /// yields the constant `normal_volume` curve.
    pub fn compile(narration: &[&AudioClip], settings: &DuckingConfig) -> Self {
        if !settings.enabled || narration.is_empty() {
            return Self::constant(settings.normal_volume);
        }

        let mut windows = Vec::with_capacity(narration.len() * 3);
        for clip in narration {
            let fade_start = (clip.start_secs - DUCK_LOOKAHEAD_SECS).max(0.0);
            let fade_end = fade_start + settings.fade_secs;
            let unfade_start = clip.end_secs();
            let unfade_end = unfade_start + settings.fade_secs;

            windows.push(VolumeWindow {
                start_secs: fade_start,
                end_secs: fade_end,
                shape: WindowShape::Ramp {
                    from: settings.normal_volume,
                    to: settings.ducked_volume,
                },
            });
            if unfade_start > fade_end {
                windows.push(VolumeWindow {
                    start_secs: fade_end,
                    end_secs: unfade_start,
                    shape: WindowShape::Hold {
                        level: settings.ducked_volume,
                    },
                });
            }
            windows.push(VolumeWindow {
                start_secs: unfade_start,
                end_secs: unfade_end,
                shape: WindowShape::Ramp {
                    from: settings.ducked_volume,
                    to: settings.normal_volume,
                },
            });
        }

        Self {
            normal_volume: settings.normal_volume,
            windows,
        }
    }

    /// Evaluate `V(t)`. Later-inserted windows take precedence on overlap;
    /// outside every window the level is `normal_volume`.
    pub fn value_at(&self, t: f64) -> f64 {
        for window in self.windows.iter().rev() {
            if window.contains(t) {
                return window.value_at(t);
            }
        }
        self.normal_volume
    }

    pub fn is_constant(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn normal_volume(&self) -> f64 {
        self.normal_volume
    }

    /// Serialize the curve as an ffmpeg `volume` expression over `t`.
    ///
    /// Each window wraps the expression built so far, so the outermost
    /// conditional belongs to the last-inserted window and precedence matches
    /// `value_at` exactly.
    pub fn to_ffmpeg_expr(&self) -> String {
        let mut expr = format!("{:.6}", self.normal_volume);
        for window in &self.windows {
            let body = match window.shape {
                WindowShape::Hold { level } => format!("{level:.6}"),
                WindowShape::Ramp { from, to } => format!(
                    "{from:.6}+({delta:.6})*(t-{start:.6})/{span:.6}",
                    delta = to - from,
                    start = window.start_secs,
                    span = (window.end_secs - window.start_secs).max(1e-6),
                ),
            };
            expr = format!(
                "if(between(t,{start:.6},{end:.6}),{body},{expr})",
                start = window.start_secs,
                end = window.end_secs,
            );
        }
        expr
    }
}

/// Name of the rendered, ducked music track inside the workspace.
pub const MUSIC_TRACK: &str = "music-ducked.wav";

/// One ffmpeg pass rendering the music track with the ducking curve applied.
#[derive(Debug, Clone)]
pub struct MusicRenderPlan {
    /// Workspace file the music asset must be materialized to.
    pub input_name: String,

    /// Full ffmpeg argument vector.
    pub args: Vec<String>,
}

/// Build the music render pass: resample, apply the ducking curve (and any
/// authored clip volume and fades), pad, and trim to the total duration.
pub fn build_music_plan(
    music: &crate::assets::ResolvedAudioClip<'_>,
    curve: &VolumeCurve,
    total_duration_secs: f64,
    config: &reelsmith_common::config::RenderConfig,
    root: &std::path::Path,
) -> MusicRenderPlan {
    let input_name = format!("music.{}", music.asset.file_extension());

    let mut chain = vec![format!("aresample={}", config.audio_sample_rate)];

    let (clip_volume, fade_in, fade_out) = match &music.clip.role {
        reelsmith_timeline_model::clip::AudioRole::Music {
            volume,
            fade_in_secs,
            fade_out_secs,
            ..
        } => (*volume, *fade_in_secs, *fade_out_secs),
        _ => (None, None, None),
    };

    if let Some(volume) = clip_volume {
        chain.push(format!("volume={volume:.6}"));
    }

    if curve.is_constant() {
        // No automation: a plain gain is enough (equivalently, just trim the
        // music to the total duration).
        chain.push(format!("volume={:.6}", curve.normal_volume()));
    } else {
        chain.push(format!(
            "volume=volume='{}':eval=frame",
            curve.to_ffmpeg_expr()
        ));
    }

    if let Some(fade) = fade_in {
        chain.push(format!("afade=t=in:st=0:d={fade:.6}"));
    }
    if let Some(fade) = fade_out {
        chain.push(format!(
            "afade=t=out:st={:.6}:d={fade:.6}",
            (total_duration_secs - fade).max(0.0)
        ));
    }

    // Short music is padded with silence so the trim always lands exactly on
    // the total duration.
    chain.push("apad".to_string());

    let args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        root.join(&input_name).display().to_string(),
        "-af".into(),
        chain.join(","),
        "-t".into(),
        format!("{total_duration_secs:.6}"),
        "-c:a".into(),
        "pcm_s16le".into(),
        root.join(MUSIC_TRACK).display().to_string(),
    ];

    MusicRenderPlan { input_name, args }
}
