//! CLI module for rewind
//!
//! Parses flags, runs the recovery pipeline on a tokio runtime, prints the
//! JSON report on stdout and maps the result to an exit code:
//! - 0: success
//! - 1: validation failure (including unusable flags)
//! - 2: operational failure or cancellation

mod args;
mod commands;
mod io;
mod report;

pub use args::Cli;
pub use commands::{configure_logging, decide_policy, execute, finish, load_settings, LOG_LEVEL_ENV};
pub use io::{confirm, write_json, FixedAnswer, Prompter, TerminalPrompter};
pub use report::{PartitionCounts, Plan, RunReport};

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;

use crate::dispatch::CancelFlag;
use crate::error::{EXIT_OPERATIONAL, EXIT_SUCCESS, EXIT_VALIDATION};
use crate::observability::Logger;

/// Run with the process arguments
pub fn run() -> i32 {
    run_from(std::env::args_os())
}

/// Run with explicit arguments; returns the exit code
pub fn run_from<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_VALIDATION } else { EXIT_SUCCESS };
            let _ = e.print();
            return code;
        }
    };

    if let Err(e) = configure_logging(cli.log_level.as_deref()) {
        eprintln!("{}", e);
        return EXIT_VALIDATION;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[ERROR] REWIND_IO_ERROR: failed to start runtime: {}", e);
            return EXIT_OPERATIONAL;
        }
    };

    let cancel = CancelFlag::new();
    let result = runtime.block_on(async {
        let watcher = tokio::spawn(watch_interrupt(cancel.clone()));
        let mut prompter = TerminalPrompter::new(cancel.clone());
        let result = execute(&cli, &cancel, &mut prompter).await;
        watcher.abort();
        result
    });
    // A prompt abandoned on Ctrl-C leaves a thread blocked on stdin
    runtime.shutdown_timeout(Duration::from_millis(100));

    match result.and_then(|report| finish(&report)) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}

/// Stop scheduling new work on Ctrl-C; in-flight calls finish on their own
async fn watch_interrupt(cancel: CancelFlag) {
    if tokio::signal::ctrl_c().await.is_ok() {
        Logger::warn("INTERRUPTED", &[("action", "no new operations will be scheduled")]);
        cancel.cancel();
    }
}
