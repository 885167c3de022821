//! Fragment fetch scheduler.
//!
//! Downloads every fragment task to its destination with a bounded worker pool
//! (or strictly in plan order when `workers == 1`). A destination that already
//! exists is skipped without a request, so re-running after an interruption only
//! fetches what is missing. One fragment failing never stops the others; failures
//! are collected into the `FetchReport`.

mod pool;
mod progress;
mod report;
mod sequential;
mod task;

pub use progress::{ProgressCounter, ProgressStats};
pub use report::{FetchOutcome, FetchReport};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::ResumeCheck;
use crate::error::PipelineError;
use crate::http::HttpClient;
use crate::plan::FragmentTask;

use progress::Tracker;

/// Pool size and resume rule for one fetch stage.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub workers: usize,
    pub resume_check: ResumeCheck,
}

/// Fetches all `tasks`. Returns the aggregated report once every worker has
/// drained, or `PipelineError::Cancelled` if `abort` was set during the run.
///
/// `counter` is advanced once per task (duplicates included) and, when
/// `progress_tx` is `Some`, a `ProgressStats` snapshot is sent after each one.
pub fn fetch_all(
    tasks: &[FragmentTask],
    client: &HttpClient,
    opts: FetchOptions,
    abort: &Arc<AtomicBool>,
    counter: &ProgressCounter,
    progress_tx: Option<&tokio::sync::mpsc::Sender<ProgressStats>>,
) -> Result<FetchReport, PipelineError> {
    let (unique, duplicates) = task::dedupe(tasks);
    let mut tracker = Tracker::new(tasks.len(), counter.clone(), progress_tx);

    let workers = opts.workers.max(1);
    tracing::info!(
        fragments = tasks.len(),
        unique = unique.len(),
        workers,
        "fetch stage started"
    );

    if workers == 1 || unique.len() <= 1 {
        sequential::run_sequential(unique, client, opts.resume_check, abort, &mut tracker);
    } else {
        pool::run_concurrent(unique, workers, client, opts.resume_check, abort, &mut tracker);
    }

    if abort.load(Ordering::Relaxed) {
        tracing::warn!(done = counter.completed(), total = tasks.len(), "fetch stage cancelled");
        return Err(PipelineError::Cancelled);
    }

    // Repeated entries share the first occurrence's file and outcome.
    for id in duplicates {
        tracker.record_duplicate(id);
    }

    let report = tracker.finish();
    tracing::info!(
        fetched = report.fetched,
        already_present = report.already_present,
        failed = report.failures.len(),
        bytes = report.bytes,
        "fetch stage finished"
    );
    Ok(report)
}
