//! CLI for the ismdl Smooth Streaming downloader.

mod download;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use ismdl_core::config::{self, CleanupMode, FailurePolicy, IsmConfig, ResumeCheck};
use std::path::PathBuf;

const DEFAULT_DIR: &str = "download";
const DEFAULT_OUTPUT: &str = "out.mp4";

/// Download a Smooth Streaming (.ism) video and remux it into one file.
#[derive(Debug, Parser)]
#[command(name = "ismdl")]
#[command(about = "ismdl: Smooth Streaming fragment downloader", long_about = None)]
pub struct Cli {
    /// Server manifest URL, ending in `.ism` (trailing slash optional).
    #[arg(short = 'i', long = "input", value_name = "ISM_URL")]
    pub input: String,

    /// Working directory for fragments and state files [default: download].
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Output file written by the muxer.
    #[arg(short = 'o', long = "output", value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Use a manifest file already on disk instead of fetching it.
    #[arg(short = 'm', long = "manifest", value_name = "FILE", hide = true)]
    pub manifest: Option<PathBuf>,

    /// Concurrent fragment downloads (overrides config).
    #[arg(short = 'j', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Download fragments one at a time, in manifest order.
    #[arg(long, conflicts_with = "workers")]
    pub sequential: bool,

    /// Apply the audio bitstream filter when remuxing.
    #[arg(long)]
    pub audio_bsf: bool,

    /// Keep fragments and state files after a successful run.
    #[arg(long)]
    pub keep_parts: bool,

    /// What to remove after a successful run (default: whole directory when
    /// -d is given, otherwise intermediates only).
    #[arg(long, value_enum, value_name = "MODE")]
    pub cleanup: Option<CleanupArg>,

    /// What to do when some fragments could not be downloaded.
    #[arg(long = "on-failure", value_enum, value_name = "POLICY")]
    pub on_failure: Option<FailureArg>,

    /// How an existing fragment file is judged complete.
    #[arg(long = "resume-check", value_enum, value_name = "CHECK")]
    pub resume_check: Option<ResumeArg>,

    /// Let the muxer replace an existing output file.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CleanupArg {
    Intermediates,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureArg {
    Abort,
    Proceed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResumeArg {
    Exists,
    NonEmpty,
}

impl From<CleanupArg> for CleanupMode {
    fn from(a: CleanupArg) -> Self {
        match a {
            CleanupArg::Intermediates => CleanupMode::Intermediates,
            CleanupArg::Directory => CleanupMode::Directory,
        }
    }
}

impl From<FailureArg> for FailurePolicy {
    fn from(a: FailureArg) -> Self {
        match a {
            FailureArg::Abort => FailurePolicy::Abort,
            FailureArg::Proceed => FailurePolicy::Proceed,
        }
    }
}

impl From<ResumeArg> for ResumeCheck {
    fn from(a: ResumeArg) -> Self {
        match a {
            ResumeArg::Exists => ResumeCheck::Exists,
            ResumeArg::NonEmpty => ResumeCheck::NonEmpty,
        }
    }
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let cfg = cli.apply_overrides(cfg);
        download::run_download(&cli, cfg).await
    }

    /// Folds command-line flags over the loaded configuration.
    pub fn apply_overrides(&self, mut cfg: IsmConfig) -> IsmConfig {
        if self.sequential {
            cfg.workers = 1;
        } else if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if let Some(mode) = self.cleanup {
            cfg.cleanup = mode.into();
        } else if self.dir.is_some() {
            // A directory the user named is theirs to discard once the output exists.
            cfg.cleanup = CleanupMode::Directory;
        }
        if let Some(policy) = self.on_failure {
            cfg.on_fragment_failure = policy.into();
        }
        if let Some(check) = self.resume_check {
            cfg.resume_check = check.into();
        }
        cfg
    }

    pub fn work_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DIR))
    }
}

#[cfg(test)]
mod tests;
