//! Demonstration daemon that logs a heartbeat every second until stopped.
//!
//! `heartbeatd start`, `heartbeatd status`, `heartbeatd stop` and
//! `heartbeatd restart` manage it; its files are `heartbeat_worker.pid` and
//! `heartbeat_worker.log` in the working directory.

use std::process::ExitCode;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use simple_daemon::{DaemonTask, TaskError};
use tracing::info;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Default)]
struct HeartbeatWorker {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl DaemonTask for HeartbeatWorker {
    fn start(&self) -> Result<(), TaskError> {
        let mut beats: u64 = 0;
        let mut stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            let (guard, wait) = self
                .wake
                .wait_timeout(stopped, HEARTBEAT_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
            if wait.timed_out() && !*stopped {
                beats += 1;
                info!(beats, "heartbeat");
            }
        }
        info!(beats, "heartbeat worker stopped");
        Ok(())
    }

    fn stop(&self) -> Result<(), TaskError> {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wake.notify_all();
        Ok(())
    }
}

fn main() -> ExitCode {
    simple_daemon::daemonize(HeartbeatWorker::default())
}
