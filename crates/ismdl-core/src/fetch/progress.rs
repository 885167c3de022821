//! Progress reporting for the fetch stage.
//!
//! `ProgressCounter` is a monotonically advancing completed-task count that any
//! thread can read. `ProgressStats` snapshots are pushed over a channel for the
//! CLI to render.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::FetchError;
use crate::manifest::FragmentId;

use super::report::{FetchOutcome, FetchReport};

/// Shared completed-task count.
#[derive(Debug, Clone, Default)]
pub struct ProgressCounter(Arc<AtomicUsize>);

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completed(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn advance(&self) -> usize {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Snapshot of fetch progress (CLI-friendly).
#[derive(Debug, Clone)]
pub struct ProgressStats {
    /// Tasks finished so far (skipped, fetched or failed).
    pub fragments_done: usize,
    /// Total number of tasks in the plan.
    pub fragment_count: usize,
    pub failed: usize,
    /// Bytes downloaded this run.
    pub bytes_fetched: u64,
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.fragment_count == 0 {
            return 1.0;
        }
        (self.fragments_done as f64 / self.fragment_count as f64).min(1.0)
    }

    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_fetched as f64 / self.elapsed_secs
    }
}

/// Folds outcomes into a report and publishes progress. Owned by the single
/// thread that receives outcomes.
pub(super) struct Tracker<'a> {
    report: FetchReport,
    counter: ProgressCounter,
    progress_tx: Option<&'a tokio::sync::mpsc::Sender<ProgressStats>>,
    start: Instant,
    /// Settled fragments: `None` if the file is in place, else the failure text.
    settled: HashMap<FragmentId, Option<String>>,
}

impl<'a> Tracker<'a> {
    pub(super) fn new(
        total: usize,
        counter: ProgressCounter,
        progress_tx: Option<&'a tokio::sync::mpsc::Sender<ProgressStats>>,
    ) -> Self {
        Self {
            report: FetchReport {
                total,
                ..FetchReport::default()
            },
            counter,
            progress_tx,
            start: Instant::now(),
            settled: HashMap::new(),
        }
    }

    pub(super) fn record(&mut self, id: FragmentId, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::AlreadyPresent => {
                tracing::debug!(fragment = %id, "already present, skipped");
                self.report.already_present += 1;
                self.settled.entry(id).or_insert(None);
            }
            FetchOutcome::Fetched { bytes } => {
                tracing::debug!(fragment = %id, bytes, "fetched");
                self.report.fetched += 1;
                self.report.bytes += bytes;
                self.settled.insert(id, None);
            }
            // Cancellation is reported by the caller, not as a fragment failure.
            FetchOutcome::Failed(FetchError::Aborted) => {
                tracing::debug!(fragment = %id, "transfer aborted");
                return;
            }
            FetchOutcome::Failed(e) => {
                tracing::warn!(fragment = %id, "fragment fetch failed: {}", e);
                self.settled.insert(id, Some(e.to_string()));
                self.report.failures.push((id, e));
            }
        }
        let done = self.counter.advance();
        if let Some(tx) = self.progress_tx {
            let _ = tx.try_send(ProgressStats {
                fragments_done: done,
                fragment_count: self.report.total,
                failed: self.report.failures.len(),
                bytes_fetched: self.report.bytes,
                elapsed_secs: self.start.elapsed().as_secs_f64(),
            });
        }
    }

    /// Records a repeated plan entry with the outcome of its first occurrence.
    /// Entries whose first occurrence never settled are left unrecorded.
    pub(super) fn record_duplicate(&mut self, id: FragmentId) {
        let outcome = match self.settled.get(&id) {
            Some(None) => FetchOutcome::AlreadyPresent,
            Some(Some(first_error)) => FetchOutcome::Failed(FetchError::EarlierFailure(first_error.clone())),
            None => return,
        };
        self.record(id, outcome);
    }

    pub(super) fn finish(self) -> FetchReport {
        self.report
    }
}
