//! Supervises daemon launch sequencing and the task's lifetime.

use std::env;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use simple_daemon_config::Config;

use super::daemonizer::{Daemonizer, SystemDaemonizer};
use super::errors::LaunchError;
use super::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use super::{FOREGROUND_ENV_VAR, PROCESS_TARGET};
use crate::identity::DaemonPaths;
use crate::registry::PidFile;
use crate::task::{DaemonTask, TaskError};
use crate::telemetry;

/// Launch mode for the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Fork into the background and detach from the controlling terminal.
    Background,
    /// Remain attached to the terminal; primarily used for debugging and tests.
    Foreground,
}

impl LaunchMode {
    /// Foreground when `SIMPLE_DAEMON_FOREGROUND` is set, background otherwise.
    #[must_use]
    pub fn detect() -> Self {
        if env::var_os(FOREGROUND_ENV_VAR).is_some() {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// Process-level collaborators needed to control the daemon lifecycle.
pub(crate) struct ProcessControl<D, S> {
    pub(crate) mode: LaunchMode,
    pub(crate) daemonizer: D,
    pub(crate) shutdown: S,
}

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<T, D, S> {
    pub(crate) process: ProcessControl<D, S>,
    pub(crate) task: Arc<T>,
    pub(crate) config: Config,
}

enum Event {
    /// `start` returned; `None` when it panicked.
    Finished(Option<Result<(), TaskError>>),
    Shutdown(Result<(), ShutdownError>),
}

/// Runs `task` as the daemon using the production collaborators.
///
/// In [`LaunchMode::Background`] the calling process detaches first, so this
/// only returns inside the detached daemon.
pub fn run_detached<T: DaemonTask>(
    task: T,
    config: &Config,
    mode: LaunchMode,
) -> Result<(), LaunchError> {
    let plan = LaunchPlan {
        process: ProcessControl {
            mode,
            daemonizer: SystemDaemonizer::new(),
            shutdown: SystemShutdownSignal::new(),
        },
        task: Arc::new(task),
        config: config.clone(),
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<T, D, S>(plan: LaunchPlan<T, D, S>) -> Result<(), LaunchError>
where
    T: DaemonTask,
    D: Daemonizer,
    S: ShutdownSignal,
{
    let LaunchPlan {
        process,
        task,
        config,
    } = plan;
    let ProcessControl {
        mode,
        daemonizer,
        mut shutdown,
    } = process;

    let paths = DaemonPaths::new(&config, &task.identity());
    paths.prepare()?;
    if matches!(mode, LaunchMode::Background) {
        daemonizer.daemonize(&paths)?;
    }
    telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        ?mode,
        pid = std::process::id(),
        identifier = %paths.identity(),
        log = %paths.log_path().display(),
        "starting daemon runtime"
    );
    shutdown.install()?;

    let pid_file = PidFile::new(paths.pid_path());
    let pid = std::process::id();
    if let Err(source) = pid_file.claim(pid) {
        let error = LaunchError::from(source);
        error!(target: PROCESS_TARGET, error = %error, "refusing to start");
        return Err(error);
    }

    let outcome = supervise(task, shutdown, config.shutdown_timeout());
    match pid_file.release(pid) {
        Ok(true) => info!(target: PROCESS_TARGET, pid, "pid file removed"),
        Ok(false) => {}
        Err(error) => warn!(
            target: PROCESS_TARGET,
            error = %error,
            "failed to remove pid file"
        ),
    }
    match &outcome {
        Ok(()) => info!(target: PROCESS_TARGET, "shutdown sequence completed"),
        Err(error) => error!(target: PROCESS_TARGET, error = %error, "daemon terminated"),
    }
    outcome
}

/// Runs `start` on its own thread and calls `stop` once a shutdown signal
/// arrives, then waits up to `grace` for `start` to return.
fn supervise<T, S>(task: Arc<T>, mut shutdown: S, grace: Duration) -> Result<(), LaunchError>
where
    T: DaemonTask,
    S: ShutdownSignal,
{
    let (sender, events) = mpsc::channel();

    let runner = Arc::clone(&task);
    let task_events = sender.clone();
    thread::Builder::new()
        .name(String::from("daemon-task"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| runner.start())).ok();
            let _ = task_events.send(Event::Finished(outcome));
        })
        .map_err(|source| LaunchError::Thread {
            thread: "daemon-task",
            source,
        })?;

    thread::Builder::new()
        .name(String::from("shutdown-listener"))
        .spawn(move || {
            let outcome = shutdown.wait();
            let _ = sender.send(Event::Shutdown(outcome));
        })
        .map_err(|source| LaunchError::Thread {
            thread: "shutdown-listener",
            source,
        })?;

    info!(target: PROCESS_TARGET, pid = std::process::id(), "daemon task running");
    match events.recv() {
        Ok(Event::Finished(outcome)) => {
            info!(target: PROCESS_TARGET, "daemon task returned without a stop request");
            task_outcome(outcome)
        }
        Ok(Event::Shutdown(signal)) => {
            if let Err(error) = &signal {
                warn!(
                    target: PROCESS_TARGET,
                    error = %error,
                    "shutdown listener failed; stopping task"
                );
            }
            info!(target: PROCESS_TARGET, "stopping daemon task");
            let stopped = task.stop();
            let finished = await_finish(&events, grace);
            signal?;
            stopped?;
            finished
        }
        Err(_) => Err(LaunchError::TaskLost),
    }
}

fn await_finish(events: &Receiver<Event>, grace: Duration) -> Result<(), LaunchError> {
    let deadline = Instant::now() + grace;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(Event::Finished(outcome)) => return task_outcome(outcome),
            Ok(Event::Shutdown(_)) => {}
            Err(RecvTimeoutError::Timeout) => {
                return Err(LaunchError::StopTimeout {
                    timeout_ms: grace.as_millis(),
                });
            }
            Err(RecvTimeoutError::Disconnected) => return Err(LaunchError::TaskLost),
        }
    }
}

fn task_outcome(outcome: Option<Result<(), TaskError>>) -> Result<(), LaunchError> {
    match outcome {
        Some(result) => result.map_err(LaunchError::from),
        None => Err(LaunchError::TaskLost),
    }
}
