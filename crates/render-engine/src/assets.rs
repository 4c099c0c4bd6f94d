//! Generated-asset lookup.
//!
//! The application layer owns the maps of generated media; the core only
//! sees this read-only lookup, passed explicitly into each stage. A clip
//! referencing an id absent from the lookup is a hard export failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use reelsmith_common::error::{ReelsmithError, ReelsmithResult};

/// One generated media asset as an opaque byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub bytes: Vec<u8>,
}

/// Container kind sniffed from the asset's magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// PNG or JPEG still image; synthesized into a fixed-duration clip.
    Still,
    /// Anything else is handed to the media tool as-is and probed there.
    Stream,
}

impl MediaAsset {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn kind(&self) -> MediaKind {
        let b = &self.bytes;
        let png = b.starts_with(&[0x89, b'P', b'N', b'G']);
        let jpeg = b.starts_with(&[0xFF, 0xD8, 0xFF]);
        if png || jpeg {
            MediaKind::Still
        } else {
            MediaKind::Stream
        }
    }

    /// File extension used when the asset is materialized for the media tool.
    /// The tool probes content, so this only needs to be a reasonable hint.
    pub fn file_extension(&self) -> &'static str {
        let b = &self.bytes;
        if b.starts_with(&[0x89, b'P', b'N', b'G']) {
            "png"
        } else if b.starts_with(&[0xFF, 0xD8, 0xFF]) {
            "jpg"
        } else if b.starts_with(b"RIFF") {
            "wav"
        } else if b.starts_with(b"ID3") || b.starts_with(&[0xFF, 0xFB]) {
            "mp3"
        } else if b.starts_with(b"OggS") {
            "ogg"
        } else if b.len() > 8 && &b[4..8] == b"ftyp" {
            "mp4"
        } else {
            "bin"
        }
    }
}

/// A video clip paired with the generated asset its `shot_id` resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedVideoClip<'a> {
    pub clip: &'a reelsmith_timeline_model::clip::VideoClip,
    pub asset: &'a MediaAsset,
}

/// An audio clip paired with the generated asset its `source_id` resolved to.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedAudioClip<'a> {
    pub clip: &'a reelsmith_timeline_model::clip::AudioClip,
    pub asset: &'a MediaAsset,
}

/// Read-only lookup from asset id to generated media.
pub trait AssetLookup: Send + Sync {
    fn resolve(&self, asset_id: &str) -> Option<&MediaAsset>;

    /// Resolve or fail with an error naming the missing id.
    fn require(&self, asset_id: &str) -> ReelsmithResult<&MediaAsset> {
        self.resolve(asset_id)
            .ok_or_else(|| ReelsmithError::missing_asset(asset_id))
    }
}

/// In-memory asset store.
#[derive(Debug, Default)]
pub struct InMemoryAssets {
    assets: HashMap<String, MediaAsset>,
}

impl InMemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset_id: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(asset_id.into(), MediaAsset::new(bytes));
    }
}

impl AssetLookup for InMemoryAssets {
    fn resolve(&self, asset_id: &str) -> Option<&MediaAsset> {
        self.assets.get(asset_id)
    }
}

/// Asset store backed by a directory of files named `<asset_id>.<ext>`.
///
/// Used by the CLI: the generation layer drops its outputs into one
/// directory and the renderer picks them up by id.
#[derive(Debug)]
pub struct DirectoryAssets {
    assets: HashMap<String, MediaAsset>,
}

impl DirectoryAssets {
    /// Eagerly load every file in `dir`, keyed by file stem.
    pub fn load(dir: impl AsRef<Path>) -> ReelsmithResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ReelsmithError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut assets = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path: PathBuf = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let bytes = std::fs::read(&path)?;
            assets.insert(stem.to_string(), MediaAsset::new(bytes));
        }

        tracing::debug!(dir = %dir.display(), count = assets.len(), "Loaded asset directory");
        Ok(Self { assets })
    }
}

impl AssetLookup for DirectoryAssets {
    fn resolve(&self, asset_id: &str) -> Option<&MediaAsset> {
        self.assets.get(asset_id)
    }
}
