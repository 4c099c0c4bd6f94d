//! Check system capabilities.

use reelsmith_common::config::AppConfig;
use reelsmith_render_engine::transcoder::{FfmpegTranscoder, Transcoder};

pub fn run() -> anyhow::Result<()> {
    println!("Reelsmith System Check");
    println!("{}", "=".repeat(50));

    let config = AppConfig::load();
    let transcoder = FfmpegTranscoder::new(config.render.clone());

    if transcoder.is_available() {
        println!("[OK] Transcoder: {} (ffmpeg + ffprobe found)", transcoder.name());
    } else {
        println!("[FAIL] Transcoder: ffmpeg or ffprobe not found on PATH");
    }

    println!();
    println!("Render configuration:");
    println!(
        "  Output: {}x{} @ {}fps, {} crf {}",
        config.render.width,
        config.render.height,
        config.render.fps,
        config.render.video_codec,
        config.render.crf
    );
    println!(
        "  Audio: {}Hz, {}kbps, loudness {} LUFS / {} dBTP",
        config.render.audio_sample_rate,
        config.render.audio_bitrate_kbps,
        config.render.loudness_target_lufs,
        config.render.loudness_true_peak_db
    );
    println!(
        "  Ducking: {} ({} -> {} over {}s)",
        if config.render.ducking.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.render.ducking.normal_volume,
        config.render.ducking.ducked_volume,
        config.render.ducking.fade_secs
    );
    println!("  Stage timeout: {}s", config.render.stage_timeout_secs);

    println!();
    if transcoder.is_available() {
        println!("All required capabilities are available. Reelsmith is ready.");
    } else {
        println!("Install ffmpeg (which provides ffprobe) and re-run this check.");
    }

    Ok(())
}
