//! Single-worker mode: one fetch at a time, in plan order, on the calling thread.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::ResumeCheck;
use crate::http::HttpClient;
use crate::plan::FragmentTask;

use super::progress::Tracker;
use super::task::fetch_one;

pub(super) fn run_sequential(
    tasks: Vec<FragmentTask>,
    client: &HttpClient,
    check: ResumeCheck,
    abort: &AtomicBool,
    tracker: &mut Tracker<'_>,
) {
    for task in &tasks {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        let outcome = fetch_one(task, client, check, abort);
        tracker.record(task.id, outcome);
    }
}
