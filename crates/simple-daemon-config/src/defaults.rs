use camino::Utf8PathBuf;
use std::env;

#[cfg(unix)]
use dirs::runtime_dir;
#[cfg(unix)]
use libc::geteuid;

use crate::logging::LogFormat;

/// Directory name appended to the runtime or temporary base directory.
pub const WORKING_DIR_NAME: &str = "simple-daemon";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default time the controller waits for a daemon to come up.
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 5_000;

/// Default time the controller waits for a signalled daemon to exit.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

/// Default interval between pid-file and liveness probes.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default log filter expression used by the daemon.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon log file.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default startup timeout in milliseconds.
pub const fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_MS
}

/// Default shutdown timeout in milliseconds.
pub const fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

/// Default poll interval in milliseconds.
pub const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Computes the default working directory holding pid and log files.
///
/// Prefers `$XDG_RUNTIME_DIR/simple-daemon`. Without a runtime directory the
/// temporary directory is namespaced by effective user id so users sharing a
/// host never collide on pid files.
pub fn default_working_dir() -> Utf8PathBuf {
    default_working_dir_inner()
}

#[cfg(unix)]
fn default_working_dir_inner() -> Utf8PathBuf {
    if let Some(mut dir) = runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        dir.push(WORKING_DIR_NAME);
        return dir;
    }
    let mut dir = fallback_base_directory();
    dir.push(WORKING_DIR_NAME);
    dir.push(user_namespace());
    dir
}

#[cfg(not(unix))]
fn default_working_dir_inner() -> Utf8PathBuf {
    let mut dir = fallback_base_directory();
    dir.push(WORKING_DIR_NAME);
    dir
}

fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_working_dir_is_namespaced() {
        let dir = default_working_dir();
        let namespaced = dir
            .components()
            .any(|component| component.as_str() == WORKING_DIR_NAME);
        assert!(namespaced, "unexpected working dir: {dir}");
    }
}
