//! Validate a script file and its asset references.

use std::path::PathBuf;

use reelsmith_render_engine::assets::{AssetLookup, DirectoryAssets};
use reelsmith_timeline_model::builder::{self, Script};

pub fn run(script_path: PathBuf, assets_dir: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Validating script: {}", script_path.display());

    let script = Script::load(&script_path)
        .map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;

    let timeline =
        builder::build(&script).map_err(|e| anyhow::anyhow!("Script is invalid: {e}"))?;

    println!("  Title: {}", script.title);
    println!("  Shots: {}", script.shots.len());
    println!("  Narration segments: {}", script.narration.len());
    println!(
        "  Music: {}",
        if script.music.is_some() { "yes" } else { "no" }
    );
    println!("  Duration: {:.1}s", timeline.total_duration_secs());

    // Check asset references against the directory, if one was given.
    let Some(assets_dir) = assets_dir else {
        println!("\nScript is valid. (No asset directory given; references not checked.)");
        return Ok(());
    };

    let assets = DirectoryAssets::load(&assets_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load assets: {e}"))?;

    let mut missing = Vec::new();
    for clip in timeline.video_clips() {
        if assets.resolve(&clip.shot_id).is_none() {
            missing.push(clip.shot_id.clone());
        }
    }
    for clip in timeline.narration_clips() {
        if assets.resolve(clip.role.source_id()).is_none() {
            missing.push(clip.role.source_id().to_string());
        }
    }
    if let Some(clip) = timeline.music_clip() {
        if assets.resolve(clip.role.source_id()).is_none() {
            missing.push(clip.role.source_id().to_string());
        }
    }

    if missing.is_empty() {
        println!("  Assets: All present");
        println!("\nScript is valid.");
    } else {
        println!("\nMissing assets:");
        for id in &missing {
            println!("  - {id}");
        }
        println!("\n{} asset(s) missing. Render would fail.", missing.len());
    }

    Ok(())
}
