//! Reelsmith Render Engine
//!
//! Offline assembly pipeline that combines independently generated media
//! assets (stills, video clips, narration speech, music) into one deliverable
//! file according to a timeline.
//!
//! # Pipeline Architecture
//!
//! ```text
//! shot assets ─────► Normalize + Concatenate ──► silent video ─┐
//!                                                              │
//! speech assets ───► Narration Mixdown ───► narration track ───┼──► Final Mux ──► output.mp4
//!                                                              │
//! music asset ─────► Ducking Curve + Render ──► music track ───┘
//! ```
//!
//! Every stage plans its ffmpeg invocation as a pure argument vector and
//! delegates execution to a [`transcoder::Transcoder`], so the pipeline is
//! unit-testable without media tools installed.

pub mod assets;
pub mod ducking;
pub mod mux;
pub mod narration;
pub mod orchestrator;
pub mod stitch;
pub mod transcoder;
pub mod workspace;

pub use assets::*;
pub use ducking::*;
pub use orchestrator::*;
pub use transcoder::*;
