//! End-to-end run: manifest → plan → fetch → reassembly → cleanup.
//!
//! Blocking stages run on tokio's blocking pool. Cancellation is an abort
//! token checked between stages and inside every transfer; a cancelled run
//! stops where it is and leaves the working directory untouched.

mod stages;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::context::RunContext;
use crate::error::PipelineError;
use crate::fetch::{self, FetchOptions, FetchReport, ProgressCounter, ProgressStats};
use crate::manifest::{FragmentPattern, MarkerPattern};
use crate::mux::Muxer;
use crate::resolver::{ManifestSource, ResolvedManifest};
use crate::workdir::{self, CleanupSummary, RetentionPolicy};

/// What to download and where to put it.
pub struct RunRequest {
    pub manifest: ResolvedManifest,
    pub output: PathBuf,
    /// Leave all intermediates after success, overriding the cleanup mode.
    pub keep_parts: bool,
    pub pattern: Arc<dyn FragmentPattern>,
}

impl RunRequest {
    pub fn new(manifest: ResolvedManifest, output: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            output: output.into(),
            keep_parts: false,
            pattern: Arc::new(MarkerPattern::smooth_streaming()),
        }
    }

    pub fn keep_parts(mut self, keep: bool) -> Self {
        self.keep_parts = keep;
        self
    }
}

/// Abort token and progress outputs shared with the caller.
#[derive(Clone, Default)]
pub struct RunControl {
    pub abort: Arc<AtomicBool>,
    pub counter: ProgressCounter,
    pub progress_tx: Option<tokio::sync::mpsc::Sender<ProgressStats>>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, tx: tokio::sync::mpsc::Sender<ProgressStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Requests cancellation of the run.
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub fragments: usize,
    /// The list from a previous run was reused for an unchanged manifest.
    pub plan_reused: bool,
    pub report: FetchReport,
    pub output: PathBuf,
    pub cleanup: CleanupSummary,
}

fn ensure_running(abort: &AtomicBool) -> Result<(), PipelineError> {
    if abort.load(Ordering::Relaxed) {
        return Err(PipelineError::Cancelled);
    }
    Ok(())
}

/// Runs every stage for `request`.
pub async fn run(
    ctx: Arc<RunContext>,
    request: RunRequest,
    muxer: Arc<dyn Muxer>,
    control: RunControl,
) -> Result<RunSummary> {
    let RunRequest {
        manifest,
        output,
        keep_parts,
        pattern,
    } = request;
    let abort = Arc::clone(&control.abort);

    let (plan, plan_reused, snapshot_generated) = {
        let ctx = Arc::clone(&ctx);
        let abort = Arc::clone(&abort);
        let manifest = manifest.clone();
        tokio::task::spawn_blocking(move || -> Result<_> {
            let loaded = stages::load_manifest(&ctx, &manifest, &abort)?;
            let (plan, reused) = stages::prepare_plan(&ctx, &loaded.bytes, pattern.as_ref())?;
            Ok((plan, reused, loaded.snapshot_generated))
        })
        .await
        .context("manifest task join")??
    };
    ensure_running(&abort)?;

    let report = {
        let tasks = plan.tasks(ctx.workdir.root(), &manifest.base, &ctx.tracks);
        let ctx = Arc::clone(&ctx);
        let abort = Arc::clone(&abort);
        let control = control.clone();
        let opts = FetchOptions {
            workers: ctx.config.effective_workers(),
            resume_check: ctx.config.resume_check,
        };
        tokio::task::spawn_blocking(move || {
            fetch::fetch_all(
                &tasks,
                &ctx.http,
                opts,
                &abort,
                &control.counter,
                control.progress_tx.as_ref(),
            )
        })
        .await
        .context("fetch task join")??
    };

    let list = stages::list_for_muxer(&ctx, &plan, &report, ctx.config.on_fragment_failure)?;
    ensure_running(&abort)?;

    {
        let list = list.clone();
        let output = output.clone();
        let mux_result = tokio::task::spawn_blocking(move || muxer.mux(&list, &output))
            .await
            .context("muxer task join")?;
        if let Err(e) = mux_result {
            // The muxer shares our terminal and sees the same interrupt.
            ensure_running(&abort)?;
            return Err(e.into());
        }
    }

    let policy = RetentionPolicy::resolve(keep_parts, ctx.config.cleanup);
    let mut keep = vec![output.as_path()];
    if let ManifestSource::File(path) = &manifest.source {
        keep.push(path.as_path());
    }
    let cleanup = workdir::cleanup(&ctx.workdir, &plan, policy, &keep, snapshot_generated)?;

    Ok(RunSummary {
        fragments: plan.len(),
        plan_reused,
        report,
        output,
        cleanup,
    })
}
