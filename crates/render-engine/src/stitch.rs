//! Video clip normalization and concatenation.
//!
//! Source clips arrive with arbitrary resolutions, frame rates, and codecs
//! (and some shots only exist as still images). Concatenating heterogeneous
//! sources directly produces visible stutter and freezes, so every clip is
//! first re-encoded to one canonical format; the concatenation itself is then
//! a cheap stream copy with no further quality loss.

use std::path::Path;

use reelsmith_common::config::RenderConfig;
use reelsmith_common::error::{ReelsmithError, ReelsmithResult};

use crate::assets::{MediaKind, ResolvedVideoClip};

/// Name of the stitched, silent video inside the workspace.
pub const STITCHED_VIDEO: &str = "stitched.mp4";

/// Name of the concat demuxer manifest inside the workspace.
pub const CONCAT_MANIFEST: &str = "concat.txt";

const STAGE: &str = "stitch";

/// One per-clip normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizeStep {
    /// Workspace file the source asset must be materialized to.
    pub input_name: String,

    /// Workspace file the normalized clip is written to.
    pub output_name: String,

    /// Full ffmpeg argument vector for this pass.
    pub args: Vec<String>,
}

/// The complete stitch stage: N normalization passes plus one stream-copy
/// concatenation.
#[derive(Debug, Clone)]
pub struct StitchPlan {
    pub steps: Vec<NormalizeStep>,

    /// concat demuxer manifest content (relative file names, resolved against
    /// the manifest's own directory).
    pub manifest: String,

    /// ffmpeg argument vector for the concatenation pass.
    pub concat_args: Vec<String>,

    /// Sum of input clip durations.
    pub expected_duration_secs: f64,
}

/// Build the stitch plan for clips sorted by start time.
///
/// Overlapping video clips are an authoring bug and are rejected here rather
/// than producing undefined output.
pub fn build_stitch_plan(
    clips: &[ResolvedVideoClip<'_>],
    config: &RenderConfig,
    root: &Path,
) -> ReelsmithResult<StitchPlan> {
    if clips.is_empty() {
        return Err(ReelsmithError::transcode(
            STAGE,
            "timeline has no video clips",
        ));
    }

    for pair in clips.windows(2) {
        let (prev, next) = (pair[0].clip, pair[1].clip);
        if next.start_secs < prev.end_secs() - 1e-6 {
            return Err(ReelsmithError::transcode(
                STAGE,
                format!(
                    "video clips '{}' and '{}' overlap on the video track",
                    prev.id, next.id
                ),
            ));
        }
    }

    let vf = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
        w = config.width,
        h = config.height,
        fps = config.fps,
    );

    let mut steps = Vec::with_capacity(clips.len());
    let mut manifest = String::new();
    let mut expected_duration_secs = 0.0;

    for (index, resolved) in clips.iter().enumerate() {
        let clip = resolved.clip;
        let input_name = format!("src-{index:03}.{}", resolved.asset.file_extension());
        let output_name = format!("norm-{index:03}.mp4");
        let input_path = root.join(&input_name);
        let output_path = root.join(&output_name);

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
        ];

        match resolved.asset.kind() {
            MediaKind::Still => {
                // A still shot is synthesized into a fixed-duration clip
                // rather than degraded to a single frame.
                args.push("-loop".into());
                args.push("1".into());
                args.push("-t".into());
                args.push(format!("{:.6}", clip.duration_secs));
                args.push("-i".into());
                args.push(input_path.display().to_string());
            }
            MediaKind::Stream => {
                if let Some(trim) = &clip.trim {
                    args.push("-ss".into());
                    args.push(format!("{:.6}", trim.start_secs));
                    args.push("-t".into());
                    args.push(format!("{:.6}", trim.duration_secs()));
                }
                args.push("-i".into());
                args.push(input_path.display().to_string());
                args.push("-t".into());
                args.push(format!("{:.6}", clip.duration_secs));
            }
        }

        args.push("-vf".into());
        args.push(vf.clone());
        args.push("-an".into());
        args.push("-c:v".into());
        args.push(config.video_codec.clone());
        args.push("-preset".into());
        args.push("medium".into());
        args.push("-crf".into());
        args.push(config.crf.to_string());
        args.push("-pix_fmt".into());
        args.push("yuv420p".into());
        args.push(output_path.display().to_string());

        manifest.push_str(&format!("file '{output_name}'\n"));
        expected_duration_secs += clip.duration_secs;

        steps.push(NormalizeStep {
            input_name,
            output_name,
            args,
        });
    }

    // All clips now share identical parameters; concatenation is a stream
    // copy, not a re-encode.
    let concat_args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        root.join(CONCAT_MANIFEST).display().to_string(),
        "-c".into(),
        "copy".into(),
        root.join(STITCHED_VIDEO).display().to_string(),
    ];

    Ok(StitchPlan {
        steps,
        manifest,
        concat_args,
        expected_duration_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MediaAsset;
    use reelsmith_timeline_model::clip::{SourceWindow, VideoClip};

    fn video_asset() -> MediaAsset {
        let mut bytes = vec![0, 0, 0, 0x20];
        bytes.extend_from_slice(b"ftypisom");
        MediaAsset::new(bytes)
    }

    fn still_asset() -> MediaAsset {
        MediaAsset::new(vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn config() -> RenderConfig {
        RenderConfig::default()
    }

    #[test]
    fn plan_duration_is_sum_of_clip_durations() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 4.0).unwrap();
        let b = VideoClip::new("v1", "shot-b", 4.0, 6.0).unwrap();
        let (asset_a, asset_b) = (video_asset(), video_asset());
        let clips = [
            ResolvedVideoClip { clip: &a, asset: &asset_a },
            ResolvedVideoClip { clip: &b, asset: &asset_b },
        ];

        let plan = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap();
        assert!((plan.expected_duration_secs - 10.0).abs() < 1e-9);
        assert_eq!(plan.steps.len(), 2);
    }

    #[test]
    fn every_clip_is_normalized_to_the_canonical_format() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 4.0).unwrap();
        let asset = video_asset();
        let clips = [ResolvedVideoClip { clip: &a, asset: &asset }];

        let plan = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap();
        let args = plan.steps[0].args.join(" ");
        assert!(args.contains("scale=1920:1080:force_original_aspect_ratio=decrease"));
        assert!(args.contains("pad=1920:1080"));
        assert!(args.contains("fps=30"));
        assert!(args.contains("-c:v libx264"));
        assert!(args.contains("-an"));
    }

    #[test]
    fn still_shot_is_synthesized_with_loop() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 3.0).unwrap();
        let asset = still_asset();
        let clips = [ResolvedVideoClip { clip: &a, asset: &asset }];

        let plan = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap();
        let args = plan.steps[0].args.join(" ");
        assert!(args.contains("-loop 1"));
        assert!(args.contains("-t 3.000000"));
        assert!(plan.steps[0].input_name.ends_with(".png"));
    }

    #[test]
    fn extracted_clip_seeks_into_the_source_window() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 6.0)
            .unwrap()
            .with_trim(SourceWindow {
                start_secs: 12.0,
                end_secs: 18.0,
            })
            .unwrap();
        let asset = video_asset();
        let clips = [ResolvedVideoClip { clip: &a, asset: &asset }];

        let plan = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap();
        let args = plan.steps[0].args.join(" ");
        assert!(args.contains("-ss 12.000000"));
        assert!(args.contains("-t 6.000000"));
    }

    #[test]
    fn concat_is_a_stream_copy_over_the_manifest() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 4.0).unwrap();
        let b = VideoClip::new("v1", "shot-b", 4.0, 6.0).unwrap();
        let (asset_a, asset_b) = (video_asset(), video_asset());
        let clips = [
            ResolvedVideoClip { clip: &a, asset: &asset_a },
            ResolvedVideoClip { clip: &b, asset: &asset_b },
        ];

        let plan = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap();
        assert_eq!(plan.manifest, "file 'norm-000.mp4'\nfile 'norm-001.mp4'\n");
        let concat = plan.concat_args.join(" ");
        assert!(concat.contains("-f concat"));
        assert!(concat.contains("-c copy"));
        assert!(concat.ends_with(&format!("/tmp/ws/{STITCHED_VIDEO}")));
    }

    #[test]
    fn overlapping_clips_are_rejected() {
        let a = VideoClip::new("v0", "shot-a", 0.0, 5.0).unwrap();
        let b = VideoClip::new("v1", "shot-b", 4.0, 6.0).unwrap();
        let (asset_a, asset_b) = (video_asset(), video_asset());
        let clips = [
            ResolvedVideoClip { clip: &a, asset: &asset_a },
            ResolvedVideoClip { clip: &b, asset: &asset_b },
        ];

        let err = build_stitch_plan(&clips, &config(), Path::new("/tmp/ws")).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn empty_clip_list_is_rejected() {
        assert!(build_stitch_plan(&[], &config(), Path::new("/tmp/ws")).is_err());
    }
}
