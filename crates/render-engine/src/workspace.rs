//! Per-request temporary storage.
//!
//! Each export request owns one workspace directory under the system temp
//! dir. Intermediate artifacts (materialized assets, normalized clips, mixed
//! tracks) live there and the whole directory is removed when the workspace
//! is dropped, on success and on every failure path alike.

use std::path::{Path, PathBuf};

use reelsmith_common::error::ReelsmithResult;

/// A scoped temp directory for one export request.
#[derive(Debug)]
pub struct StageWorkspace {
    root: PathBuf,
}

impl StageWorkspace {
    /// Create `<tmp>/reelsmith-<request_id>/`.
    pub fn create(request_id: &str) -> ReelsmithResult<Self> {
        let root = std::env::temp_dir().join(format!("reelsmith-{request_id}"));
        std::fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Created export workspace");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a named artifact inside the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Materialize bytes as a workspace file and return its path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> ReelsmithResult<PathBuf> {
        let path = self.path(name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

impl Drop for StageWorkspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if self.root.exists() {
                tracing::warn!(
                    root = %self.root.display(),
                    error = %e,
                    "Failed to remove export workspace"
                );
            }
        }
    }
}

/// Generate a unique export request id (timestamp-derived, no external
/// dependency).
pub fn request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:016x}-{:04x}", seed as u64, (seed >> 64) as u16)
}
