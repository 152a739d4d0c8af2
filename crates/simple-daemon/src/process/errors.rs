//! Defines the unified error surface for daemon launch and supervision.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use simple_daemon_config::WorkingDirError;

use super::daemonizer::DaemonizeError;
use super::shutdown::ShutdownError;
use crate::registry::RegistryError;
use crate::task::TaskError;
use crate::telemetry::TelemetryError;

/// Errors surfaced while launching or supervising the daemon process.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The working directory could not be prepared.
    #[error(transparent)]
    WorkingDir(#[from] WorkingDirError),
    /// Daemonisation failed.
    #[error("failed to daemonise: {source}")]
    Daemonize {
        /// Underlying daemonisation error.
        #[source]
        source: DaemonizeError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Installing or waiting on the shutdown listener failed.
    #[error("failed to await shutdown signal: {source}")]
    Shutdown {
        /// Underlying shutdown error.
        #[source]
        source: ShutdownError,
    },
    /// Another daemon already holds the pid file.
    #[error("Pid file {} already exists.  Not starting.", .path.display())]
    AlreadyRunning {
        /// Pid file path.
        path: PathBuf,
    },
    /// Writing, probing or removing the pid file failed.
    #[error("pid file operation failed: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
    /// A supervision thread could not be spawned.
    #[error("failed to spawn {thread} thread: {source}")]
    Thread {
        /// Name of the thread.
        thread: &'static str,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The task's `start` or `stop` capability failed.
    #[error("daemon task failed: {source}")]
    Task {
        /// Error reported by the task.
        #[source]
        source: TaskError,
    },
    /// The task panicked or vanished without reporting a result.
    #[error("daemon task ended without reporting a result")]
    TaskLost,
    /// `start` did not return within the grace period after `stop`.
    #[error("daemon task did not finish within {timeout_ms} ms of being stopped")]
    StopTimeout {
        /// Grace period in milliseconds.
        timeout_ms: u128,
    },
}

impl From<DaemonizeError> for LaunchError {
    fn from(source: DaemonizeError) -> Self {
        Self::Daemonize { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Shutdown { source }
    }
}

impl From<TaskError> for LaunchError {
    fn from(source: TaskError) -> Self {
        Self::Task { source }
    }
}

impl From<RegistryError> for LaunchError {
    fn from(source: RegistryError) -> Self {
        match source {
            RegistryError::AlreadyExists { path } => Self::AlreadyRunning { path },
            other => Self::Registry { source: other },
        }
    }
}
