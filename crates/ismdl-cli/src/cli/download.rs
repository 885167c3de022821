//! `ismdl -i <url>`: resolve, fetch, mux, clean up.

use anyhow::Result;
use ismdl_core::config::IsmConfig;
use ismdl_core::context::RunContext;
use ismdl_core::fetch::ProgressStats;
use ismdl_core::mux::FfmpegMuxer;
use ismdl_core::pipeline::{self, RunControl, RunRequest};
use ismdl_core::resolver::{DirectIsm, LocalManifest, ManifestResolver};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use super::Cli;

const PROGRESS_INTERVAL_MS: u64 = 500;

pub async fn run_download(cli: &Cli, cfg: IsmConfig) -> Result<()> {
    let resolver: Box<dyn ManifestResolver> = match &cli.manifest {
        Some(path) => Box::new(LocalManifest::new(cli.input.clone(), path.clone())),
        None => Box::new(DirectIsm::new(cli.input.clone())),
    };
    let manifest = resolver.resolve()?;

    let muxer = Arc::new(FfmpegMuxer::from_config(&cfg, cli.audio_bsf, cli.overwrite));
    let ctx = Arc::new(RunContext::new(cfg, cli.work_dir())?);

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<ProgressStats>(16);
    let control = RunControl::new().with_progress(progress_tx);

    {
        // Holds only the abort token so the progress channel closes when the run ends.
        let abort = Arc::clone(&control.abort);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping");
                abort.store(true, Ordering::Relaxed);
            }
        });
    }

    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.fragments_done >= stats.fragment_count
            {
                let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
                let failed = if stats.failed > 0 {
                    format!("  {} failed", stats.failed)
                } else {
                    String::new()
                };
                println!(
                    "  fragments {}/{} ({:.1}%)  {:.2} MiB/s{}",
                    stats.fragments_done,
                    stats.fragment_count,
                    stats.fraction() * 100.0,
                    rate_mib,
                    failed
                );
                last_print = now;
                printed = true;
            }
        }
        if printed {
            println!();
        }
    });

    let request = RunRequest::new(manifest, cli.output.clone()).keep_parts(cli.keep_parts);
    let result = pipeline::run(ctx, request, muxer, control).await;
    // The pipeline drops its progress sender when it returns; the printer then drains.
    let _ = progress_handle.await;

    let summary = result?;
    tracing::info!(
        fragments = summary.fragments,
        fetched = summary.report.fetched,
        skipped = summary.report.already_present,
        "run completed"
    );
    if summary.report.failed() > 0 {
        println!(
            "Wrote {} with {} of {} fragments missing.",
            summary.output.display(),
            summary.report.failed(),
            summary.fragments
        );
    } else {
        println!("Wrote {} ({} fragments).", summary.output.display(), summary.fragments);
    }
    Ok(())
}
