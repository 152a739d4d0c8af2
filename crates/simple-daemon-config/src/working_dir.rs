//! Prepares the working directory shared by the controller and the daemon.
//!
//! Both sides must agree on the directory so control invocations can find the
//! pid file the detached daemon wrote.

use std::fs::DirBuilder;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while preparing the working directory.
#[derive(Debug, Error)]
pub enum WorkingDirError {
    /// Creating the directory (or one of its parents) failed.
    #[error("failed to prepare working directory '{}': {source}", .path.display())]
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The configured path exists but is not a directory.
    #[error("working directory '{}' exists but is not a directory", .path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },
}

/// Ensures `path` exists as a directory, creating it with owner-only
/// permissions when missing.
pub fn prepare_working_dir(path: &Path) -> Result<(), WorkingDirError> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(WorkingDirError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(path)
        .map_err(|source| WorkingDirError::Create {
            path: path.to_path_buf(),
            source,
        })
}
