use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Browser identification sent with every manifest and fragment request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/63.0.3239.132 Safari/537.36";

/// What to delete once the muxer has produced the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupMode {
    /// Delete fragment files and list/state files; keep the working directory.
    #[default]
    Intermediates,
    /// Delete the whole working directory.
    Directory,
}

/// Whether reassembly may run when some fragments failed to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop before muxing; the working directory stays resumable.
    #[default]
    Abort,
    /// Mux whatever is present and log the gaps.
    Proceed,
}

/// How an existing fragment file is judged complete on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeCheck {
    /// Any existing file counts as done.
    #[default]
    Exists,
    /// Zero-length files are fetched again.
    NonEmpty,
}

/// Global configuration loaded from `~/.config/ismdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsmConfig {
    /// Number of concurrent fragment workers. 1 = sequential, in manifest order.
    pub workers: usize,
    /// User-Agent header for manifest and fragment requests.
    pub user_agent: String,
    /// Quality level embedded in manifest and fragment URLs.
    pub quality_level: u64,
    /// Audio track name embedded in manifest and fragment URLs.
    pub audio_track: String,
    /// Path or name of the ffmpeg binary.
    pub ffmpeg_path: String,
    /// Audio bitstream filter used when the audio filter is requested.
    pub audio_bsf: String,
    #[serde(default)]
    pub cleanup: CleanupMode,
    #[serde(default)]
    pub on_fragment_failure: FailurePolicy,
    #[serde(default)]
    pub resume_check: ResumeCheck,
    /// Connect timeout per request, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for IsmConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            quality_level: 3_449_984,
            audio_track: "english".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            audio_bsf: "aac_adtstoasc".to_string(),
            cleanup: CleanupMode::default(),
            on_fragment_failure: FailurePolicy::default(),
            resume_check: ResumeCheck::default(),
            connect_timeout_secs: 30,
            timeout_secs: 300,
        }
    }
}

impl IsmConfig {
    /// Worker count with the zero case clamped to sequential.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ismdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<IsmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = IsmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: IsmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
