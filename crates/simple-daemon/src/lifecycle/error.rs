//! Error types for daemon lifecycle operations.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

use simple_daemon_config::WorkingDirError;

use crate::registry::RegistryError;

/// Errors raised while executing lifecycle commands.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A token followed the command.
    #[error("unexpected argument '{argument}' for '{command}'")]
    UnexpectedArgument {
        /// The command being run.
        command: super::LifecycleCommand,
        /// First unexpected token.
        argument: String,
    },
    /// The working directory could not be prepared.
    #[error(transparent)]
    WorkingDir(#[from] WorkingDirError),
    /// Reading, probing or removing the pid file failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The path of the running executable was unavailable.
    #[error("failed to resolve the daemon executable: {source}")]
    ResolveBinary {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Spawning the daemon process failed.
    #[error("failed to spawn daemon binary {binary:?}: {source}")]
    LaunchDaemon {
        /// Executable that was launched.
        binary: OsString,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The spawned process exited unsuccessfully before the daemon was up.
    #[error("daemon exited before recording its pid (status: {exit_status:?})")]
    StartupFailed {
        /// Exit code, absent when killed by a signal.
        exit_status: Option<i32>,
    },
    /// No live pid was recorded before the startup deadline.
    #[error("timed out after {timeout_ms} ms waiting for a live pid in {pid_path:?}")]
    StartupTimeout {
        /// Pid file path.
        pid_path: PathBuf,
        /// Deadline in milliseconds.
        timeout_ms: u128,
    },
    /// Polling the spawned process failed.
    #[error("failed to monitor daemon launch: {source}")]
    MonitorChild {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// SIGTERM could not be delivered for a reason other than absence.
    #[error("failed to signal daemon pid {pid}: {source}")]
    SignalFailed {
        /// Signalled process.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
    /// The signalled daemon was still alive after the shutdown timeout.
    #[error("daemon pid {pid} did not exit within {timeout_ms} ms")]
    ShutdownTimeout {
        /// Signalled process.
        pid: u32,
        /// Deadline in milliseconds.
        timeout_ms: u128,
    },
    /// Writing console output failed.
    #[error("failed to write lifecycle output: {0}")]
    Io(#[source] io::Error),
}
