//! Startup readiness polling.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use super::error::LifecycleError;
use crate::registry::{PidFile, process_exists};

/// Waits until the pid file records a live process.
///
/// The spawned process exits with status 0 once it has detached, so only a
/// non-zero exit ends the wait early. Returns the recorded pid.
pub(super) fn wait_for_ready(
    pid_file: &PidFile,
    child: &mut Child,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<u32, LifecycleError> {
    let deadline = Instant::now() + timeout;
    let mut launcher_done = false;
    loop {
        if !launcher_done {
            if let Some(status) = child
                .try_wait()
                .map_err(|source| LifecycleError::MonitorChild { source })?
            {
                if !status.success() {
                    return Err(LifecycleError::StartupFailed {
                        exit_status: status.code(),
                    });
                }
                launcher_done = true;
            }
        }
        if let Some(pid) = live_pid(pid_file)? {
            return Ok(pid);
        }
        if Instant::now() >= deadline {
            return Err(LifecycleError::StartupTimeout {
                pid_path: pid_file.path().to_path_buf(),
                timeout_ms: timeout.as_millis(),
            });
        }
        thread::sleep(poll_interval);
    }
}

fn live_pid(pid_file: &PidFile) -> Result<Option<u32>, LifecycleError> {
    let Some(pid) = pid_file.recall() else {
        return Ok(None);
    };
    Ok(process_exists(pid)?.then_some(pid))
}
