//! Hourly retry-checker.
//!
//! Designed to run from cron every hour: it inspects the status history
//! and the run lock, and launches a retry run only when today (canonical
//! timezone) has no successful primary run and no live run in progress.
//! Safe to invoke any number of times; each invocation either does
//! nothing or starts at most one retry.

use std::io;
use std::path::Path;
use std::process::{Child, Command, ExitStatus};
use std::sync::mpsc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::datetime::today_string;
use crate::error::DigestError;
use crate::exit_codes::ExitCode;
use crate::lock;
use crate::paths;
use crate::report::StatusHistory;

/// Wall-clock limit for a retry run launched by the checker. A child
/// that exceeds it is killed and reported as a failure.
pub const CHILD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// What the checker decided to do this hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckDecision {
    /// Today already has a successful primary run.
    AlreadySucceeded,
    /// A live process holds the run lock right now.
    RunInProgress,
    /// No success today and nobody running: launch a retry.
    LaunchRetry,
}

/// Pure decision from history + lock state. Split out so the decision
/// table is testable without spawning anything.
#[must_use]
pub fn decide(history: &StatusHistory, lock_path: &Path, today: &str) -> CheckDecision {
    if history.has_successful_primary_run_on(today) {
        CheckDecision::AlreadySucceeded
    } else if lock::is_held_at(lock_path) {
        CheckDecision::RunInProgress
    } else {
        CheckDecision::LaunchRetry
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryCheckOptions {
    /// Log the intended action without launching anything.
    pub dry_run: bool,
    /// Operator label passed through to the launched run.
    pub tag: Option<String>,
}

/// Run the full check: decide, then act. Returns the process exit code.
pub fn run_retry_check(opts: &RetryCheckOptions) -> Result<ExitCode, DigestError> {
    let history = StatusHistory::load_default();
    let decision = decide(&history, &paths::lock_path(), &today_string());

    match decision {
        CheckDecision::AlreadySucceeded => {
            info!("today already has a successful primary run, nothing to do");
            Ok(ExitCode::SUCCESS)
        }
        CheckDecision::RunInProgress => {
            warn!("a live run holds the lock, standing down");
            Ok(ExitCode::LOCK_HELD)
        }
        CheckDecision::LaunchRetry => {
            if opts.dry_run {
                info!("dry run: would launch a retry run");
                return Ok(ExitCode::SUCCESS);
            }
            launch_retry_run(opts.tag.as_deref())
        }
    }
}

/// Launch `parkdaily run --retry` as a subprocess and propagate its exit
/// code, killing it if it outlives [`CHILD_TIMEOUT`].
fn launch_retry_run(tag: Option<&str>) -> Result<ExitCode, DigestError> {
    let exe = std::env::current_exe()?;
    let mut cmd = Command::new(exe);
    cmd.arg("run").arg("--retry");
    if let Some(tag) = tag {
        cmd.args(["--tag", tag]);
    }

    info!("launching retry run");
    let child = cmd.spawn()?;
    match wait_with_timeout(child, CHILD_TIMEOUT)? {
        Some(status) => {
            let code = status.code().unwrap_or(crate::exit_codes::codes::FAILURE);
            info!(code, "retry run finished");
            Ok(ExitCode::from_i32(code))
        }
        None => {
            error!(
                timeout_seconds = CHILD_TIMEOUT.as_secs(),
                "retry run exceeded its time limit and was killed"
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Wait for a child with a wall-clock limit. `None` means the child was
/// killed after exceeding the limit.
fn wait_with_timeout(child: Child, timeout: Duration) -> io::Result<Option<ExitStatus>> {
    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut child = child;
        let _ = tx.send(child.wait());
    });

    match rx.recv_timeout(timeout) {
        Ok(status) => status.map(Some),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            kill_child(pid);
            // Reap so the waiter thread can exit.
            let _ = rx.recv_timeout(Duration::from_secs(5));
            Ok(None)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(io::Error::other(
            "child waiter thread exited without reporting a status",
        )),
    }
}

fn kill_child(pid: u32) {
    #[cfg(unix)]
    unsafe {
        libc::kill(pid as i32, libc::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = pid;
}
