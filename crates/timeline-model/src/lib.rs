//! Reelsmith Timeline Model
//!
//! Defines the core data contracts for promo-video assembly:
//! - **Clips:** Positioned intervals referencing one generated media asset
//! - **Tracks:** Insertion-ordered groupings of clips of one kind
//! - **Timeline:** The top-level structure describing what plays when
//! - **Builder:** Converts an authored script into a Timeline
//!
//! All times are absolute timeline positions in seconds. A Timeline is an
//! immutable snapshot: every mutation returns a new Timeline so the render
//! engine's view stays consistent mid-edit.

pub mod builder;
pub mod clip;
pub mod timeline;

pub use builder::*;
pub use clip::*;
pub use timeline::*;
