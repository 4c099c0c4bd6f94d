//! Export orchestration.
//!
//! Runs the four stages of one export request in sequence: stitch the video
//! track, mix the narration track, render the ducked music track, then mux.
//! Stage N+1 consumes stage N's output, so ordering is load-bearing only for
//! the final mux; the request still runs the stages sequentially and relies
//! on request-level concurrency (independent exports, independent temp
//! namespaces) for throughput.
//!
//! All intermediate artifacts live in a per-request [`StageWorkspace`] that
//! is removed on every exit path. A failed export leaves nothing behind and
//! must be restarted from the top.

use std::path::PathBuf;
use std::time::Instant;

use serde::Serialize;

use reelsmith_common::config::RenderConfig;
use reelsmith_common::error::{ReelsmithError, ReelsmithResult};
use reelsmith_timeline_model::timeline::Timeline;

use crate::assets::{AssetLookup, ResolvedAudioClip, ResolvedVideoClip};
use crate::ducking::VolumeCurve;
use crate::transcoder::Transcoder;
use crate::workspace::{request_id, StageWorkspace};

/// One export request. The timeline snapshot is consumed and discarded; it
/// is not a durable store.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub timeline: Timeline,

    /// Where the deliverable is written.
    pub output_path: PathBuf,
}

/// Wall-clock spent in one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_secs: f64,
}

/// Export result reported to the caller and written next to the deliverable.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub output_path: PathBuf,
    pub duration_secs: f64,
    pub byte_size: u64,
    pub stages: Vec<StageTiming>,
    pub completed_at: String,
}

/// Render one export request end to end.
pub async fn render_export(
    request: ExportRequest,
    assets: &dyn AssetLookup,
    config: &RenderConfig,
    transcoder: &dyn Transcoder,
) -> ReelsmithResult<ExportOutput> {
    let started = Instant::now();
    tracing::info!(
        output = %request.output_path.display(),
        transcoder = transcoder.name(),
        "Starting export"
    );

    if !transcoder.is_available() {
        return Err(ReelsmithError::unsupported(format!(
            "transcoder '{}' is not available on this system",
            transcoder.name()
        )));
    }

    let total_duration_secs = request.timeline.total_duration_secs();
    if total_duration_secs <= 0.0 {
        return Err(ReelsmithError::render("timeline resolves to zero duration"));
    }

    // Resolve every referenced asset before spending any transcode time; a
    // dangling reference fails the export immediately, naming the id.
    let video_clips: Vec<ResolvedVideoClip<'_>> = request
        .timeline
        .video_clips()
        .into_iter()
        .map(|clip| {
            Ok(ResolvedVideoClip {
                clip,
                asset: assets.require(&clip.shot_id)?,
            })
        })
        .collect::<ReelsmithResult<_>>()?;

    let narration_clips: Vec<ResolvedAudioClip<'_>> = request
        .timeline
        .narration_clips()
        .into_iter()
        .map(|clip| {
            Ok(ResolvedAudioClip {
                clip,
                asset: assets.require(clip.role.source_id())?,
            })
        })
        .collect::<ReelsmithResult<_>>()?;

    let music_clip = request
        .timeline
        .music_clip()
        .map(|clip| {
            Ok::<_, ReelsmithError>(ResolvedAudioClip {
                clip,
                asset: assets.require(clip.role.source_id())?,
            })
        })
        .transpose()?;

    // Removed on drop, on success and failure alike.
    let ws = StageWorkspace::create(&request_id())?;
    let mut stages = Vec::with_capacity(4);

    let stage_started = Instant::now();
    let video = transcoder.stitch(&video_clips, &ws)?;
    stages.push(StageTiming {
        stage: "stitch".to_string(),
        elapsed_secs: stage_started.elapsed().as_secs_f64(),
    });

    let stage_started = Instant::now();
    let narration = transcoder.render_narration(&narration_clips, total_duration_secs, &ws)?;
    stages.push(StageTiming {
        stage: "narration".to_string(),
        elapsed_secs: stage_started.elapsed().as_secs_f64(),
    });

    let music = match &music_clip {
        Some(resolved) => {
            let stage_started = Instant::now();
            let curve = VolumeCurve::compile(
                &request.timeline.narration_clips(),
                &config.ducking,
            );
            let output = transcoder.render_music(resolved, &curve, total_duration_secs, &ws)?;
            stages.push(StageTiming {
                stage: "music".to_string(),
                elapsed_secs: stage_started.elapsed().as_secs_f64(),
            });
            Some(output)
        }
        None => None,
    };

    let stage_started = Instant::now();
    let deliverable = transcoder.mux(&video, &narration, music.as_ref(), &ws)?;
    stages.push(StageTiming {
        stage: "mux".to_string(),
        elapsed_secs: stage_started.elapsed().as_secs_f64(),
    });

    if let Some(parent) = request.output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&request.output_path, &deliverable.bytes)?;

    let output = ExportOutput {
        output_path: request.output_path.clone(),
        duration_secs: deliverable.duration_secs,
        byte_size: deliverable.byte_size,
        stages,
        completed_at: chrono::Utc::now().to_rfc3339(),
    };

    let report_path = request.output_path.with_extension("report.json");
    match serde_json::to_string_pretty(&output) {
        Ok(report) => {
            if let Err(err) = std::fs::write(&report_path, report) {
                tracing::warn!(error = %err, path = %report_path.display(), "Failed to write export report");
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "Failed to serialize export report");
        }
    }

    tracing::info!(
        duration_secs = output.duration_secs,
        byte_size = output.byte_size,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Export finished"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::InMemoryAssets;
    use crate::transcoder::{MediaOutput, MuxOutput};
    use crate::workspace::request_id;
    use reelsmith_timeline_model::builder::{
        self, MusicBrief, NarrationSegment, Script, Shot, ShotSource,
    };
    use std::path::Path;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockTranscoder {
        calls: Mutex<Vec<String>>,
        fail_stage: Option<&'static str>,
        seen_root: Mutex<Option<PathBuf>>,
        mux_saw_music: Mutex<Option<bool>>,
    }

    impl MockTranscoder {
        fn touch(&self, stage: &str, ws: &StageWorkspace) -> ReelsmithResult<()> {
            self.calls.lock().unwrap().push(stage.to_string());
            *self.seen_root.lock().unwrap() = Some(ws.root().to_path_buf());
            if self.fail_stage == Some(stage) {
                return Err(ReelsmithError::transcode(stage, "mock failure"));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Transcoder for MockTranscoder {
        fn stitch(
            &self,
            clips: &[ResolvedVideoClip<'_>],
            ws: &StageWorkspace,
        ) -> ReelsmithResult<MediaOutput> {
            self.touch("stitch", ws)?;
            let duration_secs = clips.iter().map(|c| c.clip.duration_secs).sum();
            Ok(MediaOutput {
                bytes: b"video".to_vec(),
                duration_secs,
            })
        }

        fn render_narration(
            &self,
            _clips: &[ResolvedAudioClip<'_>],
            total_duration_secs: f64,
            ws: &StageWorkspace,
        ) -> ReelsmithResult<MediaOutput> {
            self.touch("narration", ws)?;
            Ok(MediaOutput {
                bytes: b"narration".to_vec(),
                duration_secs: total_duration_secs,
            })
        }

        fn render_music(
            &self,
            _music: &ResolvedAudioClip<'_>,
            _curve: &VolumeCurve,
            total_duration_secs: f64,
            ws: &StageWorkspace,
        ) -> ReelsmithResult<MediaOutput> {
            self.touch("music", ws)?;
            Ok(MediaOutput {
                bytes: b"music".to_vec(),
                duration_secs: total_duration_secs,
            })
        }

        fn mux(
            &self,
            _video: &MediaOutput,
            _narration: &MediaOutput,
            music: Option<&MediaOutput>,
            ws: &StageWorkspace,
        ) -> ReelsmithResult<MuxOutput> {
            self.touch("mux", ws)?;
            *self.mux_saw_music.lock().unwrap() = Some(music.is_some());
            Ok(MuxOutput {
                bytes: b"final".to_vec(),
                duration_secs: 12.5,
                byte_size: 5,
            })
        }

        fn is_available(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn script(with_music: bool) -> Script {
        Script {
            title: "Promo".to_string(),
            shots: vec![
                Shot {
                    id: "hero".to_string(),
                    source: ShotSource::Generated { duration_secs: 4.0 },
                },
                Shot {
                    id: "demo".to_string(),
                    source: ShotSource::Generated { duration_secs: 6.0 },
                },
            ],
            narration: vec![NarrationSegment {
                source_id: "speech-intro".to_string(),
                text: String::new(),
                start_secs: 1.0,
                end_secs: 4.0,
                volume: None,
            }],
            music: with_music.then(|| MusicBrief {
                source_id: "music-main".to_string(),
                target_duration_secs: 10.0,
                volume: None,
                fade_in_secs: None,
                fade_out_secs: None,
            }),
        }
    }

    fn assets(with_music: bool) -> InMemoryAssets {
        let mut store = InMemoryAssets::new();
        store.insert("hero", vec![1]);
        store.insert("demo", vec![2]);
        store.insert("speech-intro", vec![3]);
        if with_music {
            store.insert("music-main", vec![4]);
        }
        store
    }

    fn output_dir() -> PathBuf {
        std::env::temp_dir().join(format!("reelsmith-orch-test-{}", request_id()))
    }

    fn workspace_root(mock: &MockTranscoder) -> PathBuf {
        mock.seen_root.lock().unwrap().clone().unwrap()
    }

    #[tokio::test]
    async fn stages_run_in_order_and_deliverable_is_written() {
        let dir = output_dir();
        let output_path = dir.join("out.mp4");
        let request = ExportRequest {
            timeline: builder::build(&script(true)).unwrap(),
            output_path: output_path.clone(),
        };
        let mock = MockTranscoder::default();

        let output = render_export(request, &assets(true), &RenderConfig::default(), &mock)
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec!["stitch", "narration", "music", "mux"]);
        assert_eq!(std::fs::read(&output_path).unwrap(), b"final");
        assert!(output_path.with_extension("report.json").exists());
        assert_eq!(output.byte_size, 5);
        assert_eq!(output.stages.len(), 4);
        assert!(!workspace_root(&mock).exists(), "workspace must be removed");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn timeline_without_music_skips_the_music_stage() {
        let dir = output_dir();
        let request = ExportRequest {
            timeline: builder::build(&script(false)).unwrap(),
            output_path: dir.join("out.mp4"),
        };
        let mock = MockTranscoder::default();

        render_export(request, &assets(false), &RenderConfig::default(), &mock)
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec!["stitch", "narration", "mux"]);
        assert_eq!(*mock.mux_saw_music.lock().unwrap(), Some(false));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_asset_fails_before_any_transcode_work() {
        let dir = output_dir();
        let output_path = dir.join("out.mp4");
        let request = ExportRequest {
            timeline: builder::build(&script(true)).unwrap(),
            output_path: output_path.clone(),
        };
        // Everything except the narration asset.
        let mut store = InMemoryAssets::new();
        store.insert("hero", vec![1]);
        store.insert("demo", vec![2]);
        store.insert("music-main", vec![4]);
        let mock = MockTranscoder::default();

        let err = render_export(request, &store, &RenderConfig::default(), &mock)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("speech-intro"));
        assert!(mock.calls().is_empty(), "no stage may run");
        assert!(!output_path.exists(), "no deliverable may be produced");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn failing_stage_still_cleans_the_workspace() {
        let dir = output_dir();
        let output_path = dir.join("out.mp4");
        let request = ExportRequest {
            timeline: builder::build(&script(true)).unwrap(),
            output_path: output_path.clone(),
        };
        let mock = MockTranscoder {
            fail_stage: Some("music"),
            ..Default::default()
        };

        let err = render_export(request, &assets(true), &RenderConfig::default(), &mock)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("mock failure"));
        assert!(!output_path.exists());
        assert!(!workspace_root(&mock).exists(), "workspace must be removed");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn zero_duration_timeline_is_rejected() {
        let request = ExportRequest {
            timeline: reelsmith_timeline_model::timeline::Timeline::new(vec![]).unwrap(),
            output_path: Path::new("/tmp/never-written.mp4").to_path_buf(),
        };
        let mock = MockTranscoder::default();

        let err = render_export(
            request,
            &InMemoryAssets::new(),
            &RenderConfig::default(),
            &mock,
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("zero duration"));
    }
}
