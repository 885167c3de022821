//! Resolver interface for turning higher-level inputs into a manifest.
//!
//! The pipeline only depends on this trait. Resolvers that scrape a video page
//! and look up its source listing live outside this crate and return the
//! `.ism` URL (and optionally the manifest text) they found.

use anyhow::Result;
use std::path::PathBuf;

use crate::url_model::IsmUrl;

/// Where the manifest bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// Fetch from the manifest URL derived from the `.ism` base.
    Remote,
    /// Read from a local file.
    File(PathBuf),
    /// Already in memory.
    Text(String),
}

/// Base URL for fragment requests plus the manifest source.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    pub base: IsmUrl,
    pub source: ManifestSource,
}

/// Trait implemented by manifest resolvers.
pub trait ManifestResolver {
    fn resolve(&self) -> Result<ResolvedManifest>;
}

/// A server manifest URL given directly; the manifest is fetched remotely.
#[derive(Debug, Clone)]
pub struct DirectIsm {
    url: String,
}

impl DirectIsm {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ManifestResolver for DirectIsm {
    fn resolve(&self) -> Result<ResolvedManifest> {
        Ok(ResolvedManifest {
            base: IsmUrl::parse(&self.url)?,
            source: ManifestSource::Remote,
        })
    }
}

/// A server manifest URL (for fragment requests) plus a manifest file already
/// on disk, e.g. the snapshot of an earlier run.
#[derive(Debug, Clone)]
pub struct LocalManifest {
    url: String,
    path: PathBuf,
}

impl LocalManifest {
    pub fn new(url: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            path: path.into(),
        }
    }
}

impl ManifestResolver for LocalManifest {
    fn resolve(&self) -> Result<ResolvedManifest> {
        Ok(ResolvedManifest {
            base: IsmUrl::parse(&self.url)?,
            source: ManifestSource::File(self.path.clone()),
        })
    }
}
