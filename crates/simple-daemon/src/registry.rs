//! Pid-file persistence and liveness probing.
//!
//! The pid file is the only evidence that a daemon for an identity may be
//! running. A file whose process has vanished is an expected state, reported
//! by [`PidFile::is_sane`] returning `false` rather than as an error.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::{debug, info};

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Errors raised by pid-file operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Writing the pid file failed.
    #[error("failed to write pid file {path:?}: {source}")]
    Write {
        /// Pid file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The pid file already exists, so it was left untouched.
    #[error("pid file {path:?} already exists")]
    AlreadyExists {
        /// Pid file path.
        path: PathBuf,
    },
    /// Removing the pid file failed.
    #[error("failed to remove pid file {path:?}: {source}")]
    Remove {
        /// Pid file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Probing the recorded process failed for a reason other than absence.
    #[error("failed to check process {pid}: {source}")]
    CheckProcess {
        /// Probed process id.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
}

/// Handle on the pid file of one daemon identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Wraps the pid file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the pid file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Returns `true` when a pid file is present, whatever its content.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes `pid` as decimal text, creating or truncating the file.
    pub fn store(&self, pid: u32) -> Result<(), RegistryError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        self.write_with(&options, pid)
    }

    /// Atomically creates the pid file and records `pid` in it.
    ///
    /// Fails with [`RegistryError::AlreadyExists`] when the file is present,
    /// leaving the existing record untouched. Concurrent claimants race on the
    /// exclusive create, so exactly one of them wins.
    pub fn claim(&self, pid: u32) -> Result<(), RegistryError> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        match self.write_with(&options, pid) {
            Err(RegistryError::Write { source, .. })
                if source.kind() == io::ErrorKind::AlreadyExists =>
            {
                Err(RegistryError::AlreadyExists {
                    path: self.path.clone(),
                })
            }
            other => other,
        }
    }

    /// Reads the recorded pid.
    ///
    /// A missing, unreadable or malformed file yields `None`.
    #[must_use]
    pub fn recall(&self) -> Option<u32> {
        let content = fs::read_to_string(&self.path).ok()?;
        content.trim().parse::<u32>().ok()
    }

    /// Returns `true` when the recorded pid names a process that exists.
    ///
    /// No record, or a record whose process is gone, yields `false`.
    pub fn is_sane(&self) -> Result<bool, RegistryError> {
        match self.recall() {
            Some(pid) => process_exists(pid),
            None => Ok(false),
        }
    }

    /// Deletes the pid file. Returns `false` when it was already gone.
    pub fn remove(&self) -> Result<bool, RegistryError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(RegistryError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Deletes the pid file only while it still records `pid`.
    ///
    /// A successor daemon may already have claimed the file after a `stop`;
    /// its record is left alone.
    pub fn release(&self, pid: u32) -> Result<bool, RegistryError> {
        if self.recall() != Some(pid) {
            debug!(
                target: REGISTRY_TARGET,
                pid,
                file = %self.path.display(),
                "pid file no longer ours; leaving it in place"
            );
            return Ok(false);
        }
        self.remove()
    }

    fn write_with(&self, options: &OpenOptions, pid: u32) -> Result<(), RegistryError> {
        let mut options = options.clone();
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let write_error = |source| RegistryError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = options.open(&self.path).map_err(write_error)?;
        let written = write!(file, "{pid}").and_then(|()| file.sync_all());
        if let Err(source) = written {
            // A half-written record must not block later starts.
            let _ = fs::remove_file(&self.path);
            return Err(write_error(source));
        }
        info!(
            target: REGISTRY_TARGET,
            pid,
            file = %self.path.display(),
            "pid file written"
        );
        Ok(())
    }
}

/// Probes whether a process with `pid` exists on this host.
///
/// A process that exists but belongs to another user still counts as
/// present. Only "no such process" maps to `false`; other failures propagate.
pub fn process_exists(pid: u32) -> Result<bool, RegistryError> {
    let Some(target) = single_process(pid) else {
        return Ok(false);
    };
    match kill(target, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(RegistryError::CheckProcess { pid, source }),
    }
}

/// Converts a recorded pid into a `kill(2)` target naming one process.
///
/// Pid 0 and values beyond `pid_t` would address process groups, so they
/// yield `None`.
pub(crate) fn single_process(pid: u32) -> Option<Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .map(Pid::from_raw)
}
