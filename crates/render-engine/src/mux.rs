//! Final mix and mux.
//!
//! Mixes the narration and ducked-music tracks into one audio stream and
//! combines it with the stitched video. The picture data is stream-copied,
//! never re-encoded, so this stage is cheap and lossless for video.

use std::path::Path;

use reelsmith_common::config::RenderConfig;

/// Name of the deliverable inside the workspace.
pub const FINAL_OUTPUT: &str = "final.mp4";

/// Workspace file names the mux pass reads.
pub const MUX_VIDEO_INPUT: &str = "mux-video.mp4";
pub const MUX_NARRATION_INPUT: &str = "mux-narration.wav";
pub const MUX_MUSIC_INPUT: &str = "mux-music.wav";

/// The final mux pass.
#[derive(Debug, Clone)]
pub struct MuxPlan {
    pub args: Vec<String>,
}

/// Build the mux argument vector. `has_music` selects between mixing two
/// audio tracks and passing the narration track through alone.
pub fn build_mux_plan(has_music: bool, config: &RenderConfig, root: &Path) -> MuxPlan {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-i".into(),
        root.join(MUX_VIDEO_INPUT).display().to_string(),
        "-i".into(),
        root.join(MUX_NARRATION_INPUT).display().to_string(),
    ];

    if has_music {
        args.push("-i".into());
        args.push(root.join(MUX_MUSIC_INPUT).display().to_string());
        args.push("-filter_complex".into());
        args.push("[1:a][2:a]amix=inputs=2:duration=longest:normalize=0[aout]".into());
        args.push("-map".into());
        args.push("0:v".into());
        args.push("-map".into());
        args.push("[aout]".into());
    } else {
        args.push("-map".into());
        args.push("0:v".into());
        args.push("-map".into());
        args.push("1:a".into());
    }

    args.extend([
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        format!("{}k", config.audio_bitrate_kbps.max(64)),
        "-movflags".into(),
        "+faststart".into(),
        "-shortest".into(),
        root.join(FINAL_OUTPUT).display().to_string(),
    ]);

    MuxPlan { args }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picture_is_stream_copied() {
        let plan = build_mux_plan(true, &RenderConfig::default(), Path::new("/ws"));
        let args = plan.args.join(" ");
        assert!(args.contains("-c:v copy"));
        assert!(args.contains("-c:a aac"));
        assert!(args.contains("-movflags +faststart"));
    }

    #[test]
    fn narration_and_music_are_mixed_without_renormalization() {
        let plan = build_mux_plan(true, &RenderConfig::default(), Path::new("/ws"));
        let args = plan.args.join(" ");
        assert!(args.contains("[1:a][2:a]amix=inputs=2:duration=longest:normalize=0[aout]"));
        assert!(args.contains("-map [aout]"));
    }

    #[test]
    fn without_music_narration_is_mapped_directly() {
        let plan = build_mux_plan(false, &RenderConfig::default(), Path::new("/ws"));
        let args = plan.args.join(" ");
        assert!(!args.contains("amix"));
        assert!(args.contains("-map 1:a"));
    }
}
