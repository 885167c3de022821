//! Per-run context threaded through every stage.

use anyhow::Result;
use std::path::PathBuf;

use crate::config::IsmConfig;
use crate::http::HttpClient;
use crate::url_model::TrackSelection;
use crate::workdir::WorkDir;

/// Configuration, working directory and HTTP client for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: IsmConfig,
    pub workdir: WorkDir,
    pub http: HttpClient,
    pub tracks: TrackSelection,
}

impl RunContext {
    /// Builds the context, creating the working directory if absent.
    pub fn new(config: IsmConfig, work_dir: impl Into<PathBuf>) -> Result<Self> {
        let workdir = WorkDir::create(work_dir)?;
        let http = HttpClient::from_config(&config);
        let tracks = TrackSelection::new(config.quality_level, config.audio_track.clone());
        Ok(Self {
            config,
            workdir,
            http,
            tracks,
        })
    }
}
