//! Render a script to a finished video.

use std::path::PathBuf;

use reelsmith_common::config::AppConfig;
use reelsmith_render_engine::assets::DirectoryAssets;
use reelsmith_render_engine::orchestrator::{render_export, ExportRequest};
use reelsmith_render_engine::transcoder::FfmpegTranscoder;
use reelsmith_timeline_model::builder::{self, Script};

pub async fn run(
    script_path: PathBuf,
    assets_dir: PathBuf,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
) -> anyhow::Result<()> {
    println!("Rendering script: {}", script_path.display());

    let script = Script::load(&script_path)
        .map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;
    let timeline =
        builder::build(&script).map_err(|e| anyhow::anyhow!("Failed to build timeline: {e}"))?;

    let assets = DirectoryAssets::load(&assets_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load assets: {e}"))?;

    let mut config = AppConfig::load().render;
    if let Some(width) = width {
        config.width = width;
    }
    if let Some(height) = height {
        config.height = height;
    }
    if let Some(fps) = fps {
        config.fps = fps;
    }

    let output_path = output.unwrap_or_else(|| {
        let stem = script_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        PathBuf::from(format!("{stem}.mp4"))
    });

    println!("  Title: {}", script.title);
    println!("  Duration: {:.1}s", timeline.total_duration_secs());
    println!("  Output: {}", output_path.display());
    println!(
        "  Resolution: {}x{} @ {}fps",
        config.width, config.height, config.fps
    );

    let transcoder = FfmpegTranscoder::new(config.clone());
    let request = ExportRequest {
        timeline,
        output_path: output_path.clone(),
    };

    match render_export(request, &assets, &config, &transcoder).await {
        Ok(result) => {
            println!("\nRender complete: {}", result.output_path.display());
            println!(
                "  {:.1}s, {} bytes, finished at {}",
                result.duration_secs, result.byte_size, result.completed_at
            );
            for stage in &result.stages {
                println!("  {:>10}: {:.2}s", stage.stage, stage.elapsed_secs);
            }
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Render failed: {e}")),
    }
}
