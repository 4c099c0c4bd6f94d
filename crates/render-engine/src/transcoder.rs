//! Media tool execution.
//!
//! Every stage delegates its transcoding work to a [`Transcoder`], one
//! operation per stage contract. The production implementation shells out to
//! ffmpeg with a per-stage wall-clock budget; tests swap in mocks, so the
//! pipeline logic never needs media tools installed. An in-process codec
//! library could replace the subprocess without touching the stage contracts.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use reelsmith_common::config::RenderConfig;
use reelsmith_common::error::{ReelsmithError, ReelsmithResult};

use crate::assets::{ResolvedAudioClip, ResolvedVideoClip};
use crate::ducking::{self, VolumeCurve};
use crate::mux;
use crate::narration;
use crate::stitch;
use crate::workspace::StageWorkspace;

/// Raw media bytes plus the numeric metadata a stage boundary carries.
#[derive(Debug, Clone)]
pub struct MediaOutput {
    pub bytes: Vec<u8>,
    pub duration_secs: f64,
}

/// The deliverable produced by the final mux.
#[derive(Debug, Clone)]
pub struct MuxOutput {
    pub bytes: Vec<u8>,
    pub duration_secs: f64,
    pub byte_size: u64,
}

/// Capability interface for the external media-processing tool.
pub trait Transcoder: Send + Sync {
    /// Normalize and concatenate video clips into one silent video.
    fn stitch(
        &self,
        clips: &[ResolvedVideoClip<'_>],
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput>;

    /// Mix narration clips into one track of exactly `total_duration_secs`.
    fn render_narration(
        &self,
        clips: &[ResolvedAudioClip<'_>],
        total_duration_secs: f64,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput>;

    /// Render the music track with the ducking curve applied.
    fn render_music(
        &self,
        music: &ResolvedAudioClip<'_>,
        curve: &VolumeCurve,
        total_duration_secs: f64,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput>;

    /// Combine the three stage outputs into the deliverable.
    fn mux(
        &self,
        video: &MediaOutput,
        narration: &MediaOutput,
        music: Option<&MediaOutput>,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MuxOutput>;

    /// Check if this transcoder is usable on the system.
    fn is_available(&self) -> bool;

    /// Transcoder name for diagnostics.
    fn name(&self) -> &str;
}

/// Production transcoder shelling out to ffmpeg/ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    config: RenderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn stage_budget(&self) -> Duration {
        Duration::from_secs(self.config.stage_timeout_secs)
    }

    fn run_ffmpeg(&self, stage: &str, args: &[String]) -> ReelsmithResult<()> {
        tracing::debug!(stage, args = ?args, "Running ffmpeg");
        run_command("ffmpeg", args, self.stage_budget(), stage)?;
        Ok(())
    }

    fn read_output(&self, stage: &str, path: &Path) -> ReelsmithResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| {
            ReelsmithError::transcode(
                stage,
                format!("unreadable output {}: {e}", path.display()),
            )
        })
    }
}

impl Transcoder for FfmpegTranscoder {
    fn stitch(
        &self,
        clips: &[ResolvedVideoClip<'_>],
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput> {
        let started = Instant::now();
        let plan = stitch::build_stitch_plan(clips, &self.config, ws.root())?;

        for (step, resolved) in plan.steps.iter().zip(clips) {
            ws.write(&step.input_name, &resolved.asset.bytes)?;
            self.run_ffmpeg("stitch", &step.args)?;
        }
        ws.write(stitch::CONCAT_MANIFEST, plan.manifest.as_bytes())?;
        self.run_ffmpeg("stitch", &plan.concat_args)?;

        let output_path = ws.path(stitch::STITCHED_VIDEO);
        let bytes = self.read_output("stitch", &output_path)?;
        let duration_secs =
            probe_duration(&output_path).unwrap_or(plan.expected_duration_secs);

        tracing::info!(
            clips = clips.len(),
            duration_secs,
            elapsed_ms = started.elapsed().as_millis(),
            "Stitched video track"
        );
        Ok(MediaOutput {
            bytes,
            duration_secs,
        })
    }

    fn render_narration(
        &self,
        clips: &[ResolvedAudioClip<'_>],
        total_duration_secs: f64,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput> {
        let started = Instant::now();
        let plan =
            narration::build_narration_plan(clips, total_duration_secs, &self.config, ws.root())?;

        for (input_name, resolved) in plan.inputs.iter().zip(clips) {
            ws.write(input_name, &resolved.asset.bytes)?;
        }
        self.run_ffmpeg("narration", &plan.args)?;

        let bytes = self.read_output("narration", &ws.path(narration::NARRATION_TRACK))?;
        tracing::info!(
            clips = clips.len(),
            duration_secs = total_duration_secs,
            elapsed_ms = started.elapsed().as_millis(),
            "Rendered narration track"
        );
        Ok(MediaOutput {
            bytes,
            duration_secs: total_duration_secs,
        })
    }

    fn render_music(
        &self,
        music: &ResolvedAudioClip<'_>,
        curve: &VolumeCurve,
        total_duration_secs: f64,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MediaOutput> {
        let started = Instant::now();
        let plan =
            ducking::build_music_plan(music, curve, total_duration_secs, &self.config, ws.root());

        ws.write(&plan.input_name, &music.asset.bytes)?;
        self.run_ffmpeg("music", &plan.args)?;

        let bytes = self.read_output("music", &ws.path(ducking::MUSIC_TRACK))?;
        tracing::info!(
            automated = !curve.is_constant(),
            duration_secs = total_duration_secs,
            elapsed_ms = started.elapsed().as_millis(),
            "Rendered music track"
        );
        Ok(MediaOutput {
            bytes,
            duration_secs: total_duration_secs,
        })
    }

    fn mux(
        &self,
        video: &MediaOutput,
        narration: &MediaOutput,
        music: Option<&MediaOutput>,
        ws: &StageWorkspace,
    ) -> ReelsmithResult<MuxOutput> {
        let started = Instant::now();
        ws.write(mux::MUX_VIDEO_INPUT, &video.bytes)?;
        ws.write(mux::MUX_NARRATION_INPUT, &narration.bytes)?;
        if let Some(music) = music {
            ws.write(mux::MUX_MUSIC_INPUT, &music.bytes)?;
        }

        let plan = mux::build_mux_plan(music.is_some(), &self.config, ws.root());
        self.run_ffmpeg("mux", &plan.args)?;

        let output_path = ws.path(mux::FINAL_OUTPUT);
        let bytes = self.read_output("mux", &output_path)?;
        let duration_secs = probe_duration(&output_path).unwrap_or(video.duration_secs);
        let byte_size = bytes.len() as u64;

        tracing::info!(
            duration_secs,
            byte_size,
            elapsed_ms = started.elapsed().as_millis(),
            "Muxed deliverable"
        );
        Ok(MuxOutput {
            bytes,
            duration_secs,
            byte_size,
        })
    }

    fn is_available(&self) -> bool {
        command_exists("ffmpeg") && command_exists("ffprobe")
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Run an external tool with a wall-clock budget.
///
/// The child is polled until it exits or the deadline passes; on timeout it
/// is killed and the stage fails terminally (transcode failures are rarely
/// transient, so there is no retry).
fn run_command(
    program: &str,
    args: &[String],
    budget: Duration,
    stage: &str,
) -> ReelsmithResult<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReelsmithError::transcode(stage, format!("failed to start {program}: {e}")))?;

    let stderr = child.stderr.take().ok_or_else(|| {
        ReelsmithError::transcode(stage, format!("failed to capture {program} stderr"))
    })?;

    // Drain stderr concurrently so the tool never blocks on a full pipe.
    let stderr_task = std::thread::spawn(move || -> String {
        let mut reader = std::io::BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read stderr: {err}>"),
        }
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if started.elapsed() > budget {
                    tracing::warn!(stage, budget_secs = budget.as_secs(), "Killing timed-out tool");
                    child.kill().ok();
                    child.wait().ok();
                    return Err(ReelsmithError::Timeout {
                        stage: stage.to_string(),
                        budget_secs: budget.as_secs(),
                    });
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                return Err(ReelsmithError::transcode(
                    stage,
                    format!("failed to wait on {program}: {e}"),
                ));
            }
        }
    };

    let stderr_output = stderr_task
        .join()
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

    if !status.success() {
        return Err(ReelsmithError::transcode(
            stage,
            format!("{program} exited with {status}: {}", stderr_output.trim()),
        ));
    }

    Ok(())
}

fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Read a media file's duration via ffprobe.
fn probe_duration(path: &Path) -> Option<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    raw.lines().next()?.trim().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_command_succeeds_for_zero_exit() {
        let args = vec!["-c".to_string(), "exit 0".to_string()];
        run_command("sh", &args, Duration::from_secs(5), "test").unwrap();
    }

    #[test]
    fn run_command_surfaces_tool_stderr_on_failure() {
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        let err = run_command("sh", &args, Duration::from_secs(5), "test").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("boom"));
        assert!(text.contains("test"));
    }

    #[test]
    fn run_command_kills_on_timeout() {
        let args = vec!["-c".to_string(), "sleep 10".to_string()];
        let started = Instant::now();
        let err = run_command("sh", &args, Duration::from_millis(200), "slow").unwrap_err();
        assert!(matches!(err, ReelsmithError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_binary_is_a_transcode_error() {
        let err = run_command(
            "definitely-not-a-real-binary",
            &[],
            Duration::from_secs(1),
            "test",
        )
        .unwrap_err();
        assert!(matches!(err, ReelsmithError::Transcode { .. }));
    }

    #[test]
    fn command_exists_finds_the_shell() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely-not-a-real-binary"));
    }
}
