//! Reelsmith Common Utilities
//!
//! Shared infrastructure for all Reelsmith crates:
//! - Error types and result aliases
//! - Tracing/logging initialization
//! - Render and logging configuration

pub mod config;
pub mod error;
pub mod logging;

pub use config::*;
pub use error::*;
