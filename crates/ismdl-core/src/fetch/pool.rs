//! Bounded worker pool: shared task queue, fixed worker threads, result channel.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::config::ResumeCheck;
use crate::http::HttpClient;
use crate::plan::FragmentTask;

use super::progress::Tracker;
use super::report::FetchOutcome;
use super::task::fetch_one;

/// Runs `tasks` on `workers` threads. Outcomes are folded into `tracker` on the
/// calling thread as they arrive. Returns once every worker has exited; workers
/// stop pulling tasks when the queue is empty or `abort` is set.
pub(super) fn run_concurrent(
    tasks: Vec<FragmentTask>,
    workers: usize,
    client: &HttpClient,
    check: ResumeCheck,
    abort: &Arc<AtomicBool>,
    tracker: &mut Tracker<'_>,
) {
    let count = tasks.len();
    let work: Arc<Mutex<VecDeque<FragmentTask>>> = Arc::new(Mutex::new(tasks.into_iter().collect()));
    let (tx, rx) = mpsc::channel();
    let num_workers = workers.min(count).max(1);
    let mut handles = Vec::with_capacity(num_workers);
    for worker in 0..num_workers {
        let work = Arc::clone(&work);
        let tx = tx.clone();
        let abort = Arc::clone(abort);
        let client = client.clone();
        handles.push(std::thread::spawn(move || loop {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            // A poisoned queue means another worker panicked; stop pulling.
            let next = match work.lock() {
                Ok(mut q) => q.pop_front(),
                Err(_) => None,
            };
            let Some(task) = next else {
                break;
            };
            let outcome = fetch_one(&task, &client, check, &abort);
            if tx.send((task.id, outcome)).is_err() {
                break;
            }
            tracing::trace!(worker, "task done");
        }));
    }
    drop(tx);

    // Ends when every worker has dropped its sender.
    for (id, outcome) in rx {
        tracker.record(id, outcome);
    }

    for h in handles {
        if let Err(e) = h.join() {
            tracing::error!("fetch worker panicked: {:?}", e);
        }
    }
}
