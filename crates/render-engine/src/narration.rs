//! Narration track mixdown.
//!
//! Lays narration clips onto a silent base track at their absolute offsets,
//! mixes everything into one continuous stream, and loudness-normalizes the
//! result to a fixed broadcast target so clip volume is perceptually
//! consistent regardless of the source recording level. The output is always
//! exactly the requested total duration; anything past it is truncated.

use std::path::Path;

use reelsmith_common::config::RenderConfig;
use reelsmith_common::error::{ReelsmithError, ReelsmithResult};
use reelsmith_timeline_model::clip::AudioRole;

use crate::assets::ResolvedAudioClip;

/// Name of the rendered narration track inside the workspace.
pub const NARRATION_TRACK: &str = "narration.wav";

const STAGE: &str = "narration";

/// One ffmpeg pass rendering the narration track.
#[derive(Debug, Clone)]
pub struct NarrationPlan {
    /// Workspace files the speech assets must be materialized to, in clip
    /// order.
    pub inputs: Vec<String>,

    /// Full ffmpeg argument vector.
    pub args: Vec<String>,
}

/// Build the narration mixdown for clips sorted by start time.
pub fn build_narration_plan(
    clips: &[ResolvedAudioClip<'_>],
    total_duration_secs: f64,
    config: &RenderConfig,
    root: &Path,
) -> ReelsmithResult<NarrationPlan> {
    if total_duration_secs <= 0.0 {
        return Err(ReelsmithError::transcode(
            STAGE,
            "total duration resolved to zero seconds",
        ));
    }

    let output = root.join(NARRATION_TRACK).display().to_string();
    let silent_base = format!("anullsrc=r={}:cl=stereo", config.audio_sample_rate);

    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "lavfi".into(),
        "-t".into(),
        format!("{total_duration_secs:.6}"),
        "-i".into(),
        silent_base,
    ];

    if clips.is_empty() {
        // No narration: the track is pure silence of the full duration.
        args.extend([
            "-t".into(),
            format!("{total_duration_secs:.6}"),
            "-c:a".into(),
            "pcm_s16le".into(),
            output,
        ]);
        return Ok(NarrationPlan {
            inputs: Vec::new(),
            args,
        });
    }

    let mut inputs = Vec::with_capacity(clips.len());
    for (index, resolved) in clips.iter().enumerate() {
        let input_name = format!("speech-{index:03}.{}", resolved.asset.file_extension());
        args.push("-i".into());
        args.push(root.join(&input_name).display().to_string());
        inputs.push(input_name);
    }

    let mut filter = String::new();
    for (index, resolved) in clips.iter().enumerate() {
        let delay_ms = (resolved.clip.start_secs * 1000.0).round() as u64;
        let volume = match &resolved.clip.role {
            AudioRole::Narration { volume, .. } => volume.unwrap_or(1.0),
            _ => 1.0,
        };
        filter.push_str(&format!(
            "[{input}:a]aresample={sr},volume={volume:.6},adelay={delay_ms}|{delay_ms}[n{index}];",
            input = index + 1,
            sr = config.audio_sample_rate,
        ));
    }

    filter.push_str("[0:a]");
    for index in 0..clips.len() {
        filter.push_str(&format!("[n{index}]"));
    }
    filter.push_str(&format!(
        "amix=inputs={mix_inputs}:duration=first:normalize=0,\
         loudnorm=I={i}:TP={tp}:LRA=11[aout]",
        mix_inputs = clips.len() + 1,
        i = config.loudness_target_lufs,
        tp = config.loudness_true_peak_db,
    ));

    args.extend([
        "-filter_complex".into(),
        filter,
        "-map".into(),
        "[aout]".into(),
        "-t".into(),
        format!("{total_duration_secs:.6}"),
        "-c:a".into(),
        "pcm_s16le".into(),
        output,
    ]);

    Ok(NarrationPlan { inputs, args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MediaAsset;
    use reelsmith_timeline_model::clip::AudioClip;

    fn speech_asset() -> MediaAsset {
        MediaAsset::new(b"RIFF....WAVEfmt ".to_vec())
    }

    fn narration(id: &str, start: f64, duration: f64, volume: Option<f64>) -> AudioClip {
        AudioClip::new(
            id,
            start,
            duration,
            AudioRole::Narration {
                source_id: format!("speech-{id}"),
                text: String::new(),
                volume,
            },
        )
        .unwrap()
    }

    #[test]
    fn silent_base_pins_output_to_total_duration() {
        let clip = narration("n0", 5.0, 3.0, None);
        let asset = speech_asset();
        let clips = [ResolvedAudioClip { clip: &clip, asset: &asset }];

        let plan = build_narration_plan(&clips, 30.0, &RenderConfig::default(), Path::new("/ws"))
            .unwrap();
        let args = plan.args.join(" ");
        assert!(args.contains("anullsrc=r=48000:cl=stereo"));
        assert!(args.contains("-t 30.000000"));
        assert!(args.contains("duration=first"));
    }

    #[test]
    fn clips_are_delayed_to_their_absolute_offsets() {
        let early = narration("n0", 1.5, 2.0, None);
        let late = narration("n1", 12.25, 3.0, None);
        let asset = speech_asset();
        let clips = [
            ResolvedAudioClip { clip: &early, asset: &asset },
            ResolvedAudioClip { clip: &late, asset: &asset },
        ];

        let plan = build_narration_plan(&clips, 30.0, &RenderConfig::default(), Path::new("/ws"))
            .unwrap();
        let args = plan.args.join(" ");
        assert!(args.contains("adelay=1500|1500"));
        assert!(args.contains("adelay=12250|12250"));
        assert!(args.contains("amix=inputs=3"));
    }

    #[test]
    fn mix_is_loudness_normalized_to_broadcast_target() {
        let clip = narration("n0", 0.0, 2.0, None);
        let asset = speech_asset();
        let clips = [ResolvedAudioClip { clip: &clip, asset: &asset }];

        let plan = build_narration_plan(&clips, 10.0, &RenderConfig::default(), Path::new("/ws"))
            .unwrap();
        let args = plan.args.join(" ");
        assert!(args.contains("loudnorm=I=-16:TP=-1.5:LRA=11"));
    }

    #[test]
    fn per_clip_volume_is_applied() {
        let clip = narration("n0", 0.0, 2.0, Some(0.8));
        let asset = speech_asset();
        let clips = [ResolvedAudioClip { clip: &clip, asset: &asset }];

        let plan = build_narration_plan(&clips, 10.0, &RenderConfig::default(), Path::new("/ws"))
            .unwrap();
        assert!(plan.args.join(" ").contains("volume=0.800000"));
    }

    #[test]
    fn zero_clips_renders_pure_silence() {
        let plan =
            build_narration_plan(&[], 30.0, &RenderConfig::default(), Path::new("/ws")).unwrap();
        let args = plan.args.join(" ");
        assert!(plan.inputs.is_empty());
        assert!(args.contains("anullsrc"));
        assert!(args.contains("-t 30.000000"));
        assert!(!args.contains("amix"));
    }

    #[test]
    fn zero_total_duration_is_rejected() {
        assert!(build_narration_plan(&[], 0.0, &RenderConfig::default(), Path::new("/ws")).is_err());
    }
}
