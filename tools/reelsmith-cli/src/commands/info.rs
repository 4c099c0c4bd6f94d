//! Show the timeline a script resolves to.

use std::path::PathBuf;

use reelsmith_timeline_model::builder::{self, Script};
use reelsmith_timeline_model::clip::AudioRole;

pub fn run(script_path: PathBuf) -> anyhow::Result<()> {
    let script = Script::load(&script_path)
        .map_err(|e| anyhow::anyhow!("Failed to load script: {e}"))?;
    let timeline =
        builder::build(&script).map_err(|e| anyhow::anyhow!("Failed to build timeline: {e}"))?;

    println!("Script: {}", script.title);
    println!("  Total duration: {:.1}s", timeline.total_duration_secs());
    println!();

    println!("Video track:");
    for clip in timeline.video_clips() {
        println!(
            "  {:>7.2}s - {:>7.2}s  {} (shot '{}')",
            clip.start_secs,
            clip.start_secs + clip.duration_secs,
            clip.id,
            clip.shot_id
        );
    }
    println!();

    println!("Narration track:");
    let narration = timeline.narration_clips();
    if narration.is_empty() {
        println!("  (empty)");
    }
    for clip in narration {
        let text = match &clip.role {
            AudioRole::Narration { text, .. } => text.as_str(),
            _ => "",
        };
        println!(
            "  {:>7.2}s - {:>7.2}s  {}  \"{}\"",
            clip.start_secs,
            clip.start_secs + clip.duration_secs,
            clip.role.source_id(),
            text
        );
    }
    println!();

    println!("Music track:");
    match timeline.music_clip() {
        Some(clip) => println!(
            "  {:>7.2}s - {:>7.2}s  {}",
            clip.start_secs,
            clip.start_secs + clip.duration_secs,
            clip.role.source_id()
        ),
        None => println!("  (empty)"),
    }

    Ok(())
}
