//! Implements the detachment backend for the daemon process.

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;

use daemonize_me::Daemon;
use thiserror::Error;

use crate::identity::DaemonPaths;

/// Abstraction over daemonisation strategies.
pub trait Daemonizer: Send + Sync {
    /// Detaches the process from its controlling terminal.
    ///
    /// On return the caller is the detached process: a session leader's
    /// orphaned child, running in the working directory with a zero umask,
    /// stdin on the null device and stdout/stderr appended to the log file.
    fn daemonize(&self, paths: &DaemonPaths) -> Result<(), DaemonizeError>;
}

/// Errors surfaced by the daemonisation backend.
#[derive(Debug, Error)]
pub enum DaemonizeError {
    /// Opening the log file for stdout/stderr failed.
    #[error("failed to open log file {path:?}: {source}")]
    LogFile {
        /// Log file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// System-level daemonisation failed.
    #[error("{0}")]
    System(#[from] daemonize_me::DaemonError),
}

/// Daemoniser that delegates the fork/setsid/fork sequence to `daemonize-me`.
#[derive(Debug, Default)]
pub struct SystemDaemonizer;

impl SystemDaemonizer {
    /// Builds a new system daemoniser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Daemonizer for SystemDaemonizer {
    fn daemonize(&self, paths: &DaemonPaths) -> Result<(), DaemonizeError> {
        let stdout = open_log(paths)?;
        let stderr = stdout
            .try_clone()
            .map_err(|source| DaemonizeError::LogFile {
                path: paths.log_path().to_path_buf(),
                source,
            })?;
        let mut daemon = Daemon::new();
        daemon = daemon.work_dir(paths.working_dir());
        daemon = daemon.umask(0o000);
        daemon = daemon.stdout(stdout);
        daemon = daemon.stderr(stderr);
        daemon = daemon.name(OsStr::new(paths.identity().as_str()));
        daemon.start()?;
        Ok(())
    }
}

fn open_log(paths: &DaemonPaths) -> Result<File, DaemonizeError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.log_path())
        .map_err(|source| DaemonizeError::LogFile {
            path: paths.log_path().to_path_buf(),
            source,
        })
}
