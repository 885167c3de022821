//! Reassembly: hands the concatenation list to an external muxer.
//!
//! The adapter passes the list through unchanged and asks for a stream copy of
//! audio and video. It has no media logic of its own.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::IsmConfig;
use crate::error::PipelineError;

/// An external tool that concatenates the listed fragments into `output`.
pub trait Muxer: Send + Sync {
    fn mux(&self, list: &Path, output: &Path) -> Result<(), PipelineError>;
}

/// ffmpeg concat demuxer with stream copy.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: PathBuf,
    audio_bsf: Option<String>,
    overwrite: bool,
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            audio_bsf: None,
            overwrite: false,
        }
    }

    /// From config; the bitstream filter is applied only when `apply_audio_bsf`.
    pub fn from_config(cfg: &IsmConfig, apply_audio_bsf: bool, overwrite: bool) -> Self {
        let mut m = Self::new(&cfg.ffmpeg_path).overwrite(overwrite);
        if apply_audio_bsf {
            m = m.audio_bsf(cfg.audio_bsf.clone());
        }
        m
    }

    pub fn audio_bsf(mut self, bsf: impl Into<String>) -> Self {
        self.audio_bsf = Some(bsf.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Argument vector (without the program name).
    pub fn args(&self, list: &Path, output: &Path) -> Vec<String> {
        let mut args = vec!["-hide_banner".to_string()];
        args.push(if self.overwrite { "-y" } else { "-n" }.to_string());
        args.extend(
            ["-f", "concat", "-safe", "0", "-i"]
                .iter()
                .map(|s| s.to_string()),
        );
        args.push(list.to_string_lossy().into_owned());
        args.extend(
            ["-c:v", "copy", "-c:a", "copy"]
                .iter()
                .map(|s| s.to_string()),
        );
        if let Some(ref bsf) = self.audio_bsf {
            args.push("-bsf:a".to_string());
            args.push(bsf.clone());
        }
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&self, list: &Path, output: &Path) -> Result<(), PipelineError> {
        let args = self.args(list, output);
        tracing::info!(program = %self.program.display(), ?args, "starting muxer");
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .map_err(|source| PipelineError::MuxerSpawn {
                program: self.program.display().to_string(),
                source,
            })?;
        if !status.success() {
            tracing::error!(?status, "muxer failed");
            return Err(PipelineError::MuxerFailed {
                code: status.code(),
            });
        }
        tracing::info!(output = %output.display(), "muxer finished");
        Ok(())
    }
}
