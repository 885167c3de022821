//! Per-task fetch: skip-if-present check, then a single GET.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::config::ResumeCheck;
use crate::http::HttpClient;
use crate::manifest::FragmentId;
use crate::plan::FragmentTask;

use super::report::FetchOutcome;

/// Splits `tasks` into the first task per destination and the identifiers of
/// later duplicates. Order of the unique tasks follows the plan.
pub(super) fn dedupe(tasks: &[FragmentTask]) -> (Vec<FragmentTask>, Vec<FragmentId>) {
    let mut seen = HashSet::with_capacity(tasks.len());
    let mut unique = Vec::with_capacity(tasks.len());
    let mut duplicates = Vec::new();
    for t in tasks {
        if seen.insert(t.dest.clone()) {
            unique.push(t.clone());
        } else {
            duplicates.push(t.id);
        }
    }
    (unique, duplicates)
}

/// True if `dest` already satisfies the resume rule.
pub(super) fn is_present(dest: &Path, check: ResumeCheck) -> bool {
    match std::fs::metadata(dest) {
        Ok(meta) if meta.is_file() => match check {
            ResumeCheck::Exists => true,
            ResumeCheck::NonEmpty => meta.len() > 0,
        },
        _ => false,
    }
}

/// Skips or downloads one fragment.
pub(super) fn fetch_one(
    task: &FragmentTask,
    client: &HttpClient,
    check: ResumeCheck,
    abort: &AtomicBool,
) -> FetchOutcome {
    if is_present(&task.dest, check) {
        return FetchOutcome::AlreadyPresent;
    }
    match client.download_to(&task.url, &task.dest, Some(abort)) {
        Ok(bytes) => FetchOutcome::Fetched { bytes },
        Err(e) => FetchOutcome::Failed(e),
    }
}
