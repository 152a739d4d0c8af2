//! Daemon termination helpers.

use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};

use super::error::LifecycleError;
use crate::registry::{process_exists, single_process};

/// Result of asking a recorded daemon to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SignalOutcome {
    /// SIGTERM reached the process.
    Delivered,
    /// No such process.
    NotRunning,
}

/// Sends SIGTERM to `pid`.
///
/// A pid that cannot name a single process is treated as not running.
pub(super) fn signal_daemon(pid: u32) -> Result<SignalOutcome, LifecycleError> {
    let Some(target) = single_process(pid) else {
        return Ok(SignalOutcome::NotRunning);
    };
    match kill(target, Signal::SIGTERM) {
        Ok(()) => Ok(SignalOutcome::Delivered),
        Err(Errno::ESRCH) => Ok(SignalOutcome::NotRunning),
        Err(source) => Err(LifecycleError::SignalFailed { pid, source }),
    }
}

/// Polls until `pid` no longer exists, failing after `timeout`.
pub(super) fn wait_for_exit(
    pid: u32,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<(), LifecycleError> {
    let deadline = Instant::now() + timeout;
    while process_exists(pid)? && !is_zombie(pid) {
        if Instant::now() >= deadline {
            return Err(LifecycleError::ShutdownTimeout {
                pid,
                timeout_ms: timeout.as_millis(),
            });
        }
        thread::sleep(poll_interval);
    }
    Ok(())
}

/// Returns `true` when `pid` has exited but not yet been reaped.
///
/// An orphaned daemon is reaped by whichever process adopted it, which may
/// never happen inside minimal containers.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .ok()
        .and_then(|stat| {
            let (_, fields) = stat.rsplit_once(')')?;
            fields.split_whitespace().next().map(|state| state == "Z")
        })
        .unwrap_or(false)
}

#[cfg(not(target_os = "linux"))]
const fn is_zombie(_pid: u32) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    const POLL: Duration = Duration::from_millis(10);

    #[test]
    fn absent_process_is_not_running() {
        assert_eq!(
            signal_daemon(999_999_999).expect("signal"),
            SignalOutcome::NotRunning
        );
        assert_eq!(signal_daemon(0).expect("signal"), SignalOutcome::NotRunning);
    }

    #[test]
    fn terminated_child_exits_in_time() {
        let mut child = Command::new("sleep").arg("30").spawn().expect("spawn sleep");
        let pid = child.id();
        let reaper = thread::spawn(move || child.wait());
        assert_eq!(signal_daemon(pid).expect("signal"), SignalOutcome::Delivered);
        wait_for_exit(pid, Duration::from_secs(5), POLL).expect("child exits");
        let status = reaper
            .join()
            .expect("join reaper")
            .expect("reap child");
        assert!(!status.success());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn unreaped_child_counts_as_exited() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let pid = child.id();
        wait_for_exit(pid, Duration::from_secs(5), POLL).expect("zombie counts as exited");
        child.wait().expect("reap child");
    }

    #[test]
    fn surviving_process_times_out() {
        let error = wait_for_exit(std::process::id(), Duration::from_millis(50), POLL)
            .expect_err("current process never exits");
        assert!(matches!(error, LifecycleError::ShutdownTimeout { .. }));
    }
}
