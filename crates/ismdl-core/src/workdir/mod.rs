//! Working directory state: manifest snapshot, concatenation list, digest, and
//! post-reassembly cleanup.
//!
//! The list is written before any fragment is fetched. A later run against the
//! same directory reuses it when the manifest bytes hash to the recorded digest.

mod cleanup;

pub use cleanup::{cleanup, CleanupSummary, RetentionPolicy};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::checksum;
use crate::plan::{self, ConcatPlan};

/// Raw manifest bytes as retrieved.
pub const MANIFEST_SNAPSHOT: &str = "_manifest.txt";
/// Concatenation list for the muxer.
pub const LIST_FILE: &str = "_files.txt";
/// Hex SHA-256 of the manifest the list was built from.
pub const DIGEST_FILE: &str = "_manifest_sha256.txt";
/// List of the fragments actually present, used when muxing with gaps.
pub const AVAILABLE_LIST_FILE: &str = "_files_available.txt";

/// A working directory holding fragments and run state.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Opens `root`, creating it (and parents) if absent.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create working directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(MANIFEST_SNAPSHOT)
    }

    pub fn list_path(&self) -> PathBuf {
        self.root.join(LIST_FILE)
    }

    pub fn digest_path(&self) -> PathBuf {
        self.root.join(DIGEST_FILE)
    }

    pub fn available_list_path(&self) -> PathBuf {
        self.root.join(AVAILABLE_LIST_FILE)
    }

    /// Writes the manifest snapshot.
    pub fn write_snapshot(&self, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.snapshot_path();
        std::fs::write(&path, bytes)
            .with_context(|| format!("write manifest snapshot {}", path.display()))?;
        Ok(path)
    }

    /// Returns the stored plan if the list exists and was built from a manifest
    /// with digest `digest`. Any mismatch or unreadable state yields `None`.
    pub fn reusable_plan(&self, digest: &str) -> Option<ConcatPlan> {
        let list = self.list_path();
        if !list.exists() {
            return None;
        }
        let recorded = std::fs::read_to_string(self.digest_path()).ok()?;
        if recorded.trim() != digest {
            tracing::info!("manifest changed since last run; rebuilding concat list");
            return None;
        }
        match plan::read_list(&list) {
            Ok(p) if !p.is_empty() => Some(p),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("ignoring unreadable concat list: {:#}", e);
                None
            }
        }
    }

    /// Writes the list and the digest of the manifest it came from.
    pub fn save_plan(&self, plan: &ConcatPlan, digest: &str) -> Result<()> {
        plan::write_list(plan, &self.list_path())?;
        let path = self.digest_path();
        std::fs::write(&path, format!("{}\n", digest))
            .with_context(|| format!("write manifest digest {}", path.display()))?;
        Ok(())
    }
}

/// Digest used to key plan reuse.
pub fn manifest_digest(bytes: &[u8]) -> String {
    checksum::sha256_hex(bytes)
}
