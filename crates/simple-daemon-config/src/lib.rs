//! Shared configuration for the `simple-daemon` lifecycle manager.
//!
//! Values are layered by `ortho_config`: built-in defaults, then a TOML file
//! selected with `--config-path` (or `SIMPLE_DAEMON_CONFIG_PATH`), then
//! `SIMPLE_DAEMON_*` environment variables, then command-line flags. The
//! controller and the detached daemon load the same configuration so they
//! agree on where pid and log files live.

mod defaults;
mod logging;
mod working_dir;

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SHUTDOWN_TIMEOUT_MS,
    DEFAULT_STARTUP_TIMEOUT_MS, WORKING_DIR_NAME, default_log_filter, default_log_filter_string,
    default_log_format, default_poll_interval_ms, default_shutdown_timeout_ms,
    default_startup_timeout_ms, default_working_dir,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use working_dir::{WorkingDirError, prepare_working_dir};

/// Flags understood by the configuration loader.
///
/// The controller forwards only these (and their values) to
/// [`Config::load_from_iter`]; the first other token is the lifecycle command.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--working-dir",
    "--log-filter",
    "--log-format",
    "--startup-timeout-ms",
    "--shutdown-timeout-ms",
    "--poll-interval-ms",
];

/// Runtime configuration shared by the controller and the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SIMPLE_DAEMON")]
pub struct Config {
    /// Directory holding `<identifier>.pid` and `<identifier>.log`.
    #[serde(default = "default_working_dir")]
    pub working_dir: Utf8PathBuf,
    /// `tracing` filter expression applied inside the daemon.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Format of structured log lines in the daemon log file.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Upper bound on the controller's wait for a started daemon.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
    /// Upper bound on the wait for a signalled daemon to exit.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Interval between pid-file and liveness probes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Returns a copy of the configuration rooted at `working_dir`.
    #[must_use]
    pub fn with_working_dir(mut self, working_dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    /// Directory holding pid and log files.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        self.working_dir.as_path()
    }

    /// `tracing` filter expression for the daemon.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for daemon log lines.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// How long `start` waits for the daemon to record a live pid.
    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// How long `stop` waits for the signalled daemon to exit.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Interval between probes while waiting.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
