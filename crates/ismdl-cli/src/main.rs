use ismdl_core::error::PipelineError;
use ismdl_core::logging;

mod cli;

use crate::cli::Cli;

/// Exit status after Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = Cli::run_from_args().await {
        if matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::Cancelled)) {
            eprintln!("ismdl: interrupted; run again with the same arguments to resume");
            std::process::exit(EXIT_INTERRUPTED);
        }
        eprintln!("ismdl error: {:#}", err);
        std::process::exit(1);
    }
}
