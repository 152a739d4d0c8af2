//! Derives daemon identifiers and the file paths keyed on them.
//!
//! A task's identifier comes from its type name: the last path segment,
//! split at case boundaries and lowercased (`HTTPServer` becomes
//! `http_server`). Pid and log files are named after the identifier inside
//! the configured working directory.

use std::any::type_name;
use std::fmt;
use std::path::{self, Path, PathBuf};

use simple_daemon_config::{Config, WorkingDirError, prepare_working_dir};

const FALLBACK_IDENTIFIER: &str = "daemon";

/// Filesystem- and log-safe name of a daemonized task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    identifier: String,
}

impl Identity {
    /// Derives the identity of `T` from its Rust type name.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::from_type_name(type_name::<T>())
    }

    /// Derives an identity from a namespaced type name such as
    /// `Some::NestedWorker` or `crate::workers::Poller<Config>`.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let identifier = underscore(last_segment(name));
        if identifier.is_empty() {
            return Self {
                identifier: FALLBACK_IDENTIFIER.to_owned(),
            };
        }
        Self { identifier }
    }

    /// The identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.identifier.as_str()
    }

    /// File name of the pid file, `<identifier>.pid`.
    #[must_use]
    pub fn pid_file_name(&self) -> String {
        format!("{}.pid", self.identifier)
    }

    /// File name of the log file, `<identifier>.log`.
    #[must_use]
    pub fn log_file_name(&self) -> String {
        format!("{}.log", self.identifier)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.identifier)
    }
}

/// Converts a CamelCase word into its lowercase, underscore-separated form.
///
/// An underscore is inserted before an uppercase letter that follows a
/// lowercase letter or digit, and before the last capital of an acronym run
/// when a lowercase letter follows it. Hyphens become underscores.
#[must_use]
pub fn underscore(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let mut output = String::with_capacity(word.len() + 4);
    for (index, &current) in chars.iter().enumerate() {
        if index > 0 && current.is_ascii_uppercase() {
            let previous = chars.get(index - 1).copied();
            let next = chars.get(index + 1).copied();
            let after_lower = previous.is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            let ends_acronym = previous.is_some_and(|c| c.is_ascii_uppercase())
                && next.is_some_and(|c| c.is_ascii_lowercase());
            if after_lower || ends_acronym {
                output.push('_');
            }
        }
        if current == '-' {
            output.push('_');
        } else {
            output.extend(current.to_lowercase());
        }
    }
    output
}

fn last_segment(name: &str) -> &str {
    let without_generics = name.split('<').next().unwrap_or(name);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .trim_start_matches(['&', '*'])
        .trim()
}

/// Locations of the files belonging to one daemon identity.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    identity: Identity,
    working_dir: PathBuf,
    pid_path: PathBuf,
    log_path: PathBuf,
}

impl DaemonPaths {
    /// Derives paths for `identity` under the configured working directory.
    ///
    /// A relative directory is resolved against the current directory, since
    /// the detached daemon changes into the working directory. Nothing is
    /// created on disk; see [`DaemonPaths::prepare`].
    #[must_use]
    pub fn new(config: &Config, identity: &Identity) -> Self {
        let configured = config.working_dir().as_std_path();
        let resolved = path::absolute(configured).unwrap_or_else(|_| configured.to_path_buf());
        Self::in_dir(&resolved, identity)
    }

    /// Derives paths for `identity` under `working_dir`.
    #[must_use]
    pub fn in_dir(working_dir: &Path, identity: &Identity) -> Self {
        Self {
            identity: identity.clone(),
            working_dir: working_dir.to_path_buf(),
            pid_path: working_dir.join(identity.pid_file_name()),
            log_path: working_dir.join(identity.log_file_name()),
        }
    }

    /// Creates the working directory if it does not exist yet.
    pub fn prepare(&self) -> Result<(), WorkingDirError> {
        prepare_working_dir(&self.working_dir)
    }

    /// The identity these paths were derived from.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Directory holding the pid and log files.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        self.working_dir.as_path()
    }

    /// Path to `<identifier>.pid`.
    #[must_use]
    pub fn pid_path(&self) -> &Path {
        self.pid_path.as_path()
    }

    /// Path to `<identifier>.log`.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.log_path.as_path()
    }
}
