//! Smooth Streaming URL model.
//!
//! Validates the server manifest URL (`.../name.ism/`) and derives the HLS-style
//! manifest and fragment request URLs from it for a fixed quality level.

use crate::error::PipelineError;
use crate::manifest::FragmentId;

const ISM_SUFFIX: &str = ".ism/";

/// Fixed stream selection embedded in every request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSelection {
    pub quality_level: u64,
    pub audio_track: String,
}

impl TrackSelection {
    pub fn new(quality_level: u64, audio_track: impl Into<String>) -> Self {
        Self {
            quality_level,
            audio_track: audio_track.into(),
        }
    }
}

/// Validated base URL of a server manifest, always ending in `.ism/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsmUrl {
    base: String,
}

impl IsmUrl {
    /// Normalizes and validates a server manifest URL.
    ///
    /// A missing trailing slash is added. The URL must use http or https and
    /// its path must end in `.ism`.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let mut base = raw.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let invalid = || PipelineError::InvalidManifestUrl(raw.trim().to_string());
        let parsed = url::Url::parse(&base).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(invalid());
        }
        if !parsed.path().to_ascii_lowercase().ends_with(ISM_SUFFIX) {
            return Err(invalid());
        }
        // Query strings would land between `.ism/` and the request arguments.
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid());
        }
        Ok(Self { base })
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// URL of the HLS-flavoured manifest listing every fragment.
    pub fn manifest_url(&self, tracks: &TrackSelection) -> String {
        format!(
            "{}QualityLevels({})/Manifest(video,format=m3u8-aapl-v3,audiotrack={},filter=hls)",
            self.base, tracks.quality_level, tracks.audio_track
        )
    }

    /// URL of one muxed audio/video fragment.
    pub fn fragment_url(&self, id: FragmentId, tracks: &TrackSelection) -> String {
        format!(
            "{}QualityLevels({})/Fragments(video={},format=m3u8-aapl-v3,audiotrack={})",
            self.base, tracks.quality_level, id, tracks.audio_track
        )
    }
}

impl std::fmt::Display for IsmUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base)
    }
}
