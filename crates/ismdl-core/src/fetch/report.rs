//! Per-task outcomes and the aggregated fetch report.

use crate::error::FetchError;
use crate::manifest::FragmentId;

/// Result of one fragment task.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Destination existed (or is a duplicate of an earlier entry); no request.
    AlreadyPresent,
    /// Downloaded and renamed into place.
    Fetched { bytes: u64 },
    /// Request or write failed.
    Failed(FetchError),
}

/// Aggregate over all tasks of a fetch stage.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub total: usize,
    pub already_present: usize,
    pub fetched: usize,
    pub bytes: u64,
    /// Failed tasks, in completion order.
    pub failures: Vec<(FragmentId, FetchError)>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}
