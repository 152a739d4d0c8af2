//! Lifecycle command types and output abstractions.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::Write;

use strum::{Display, EnumString};

use simple_daemon_config::Config;

use super::LifecycleError;
use crate::identity::DaemonPaths;

/// Line printed when no valid command was given.
pub const USAGE: &str = "Invalid command. Please specify start, stop, restart or status.";

/// Supported lifecycle commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LifecycleCommand {
    /// Launch the daemon unless its pid file exists.
    Start,
    /// Signal the recorded daemon and clear its pid file.
    Stop,
    /// Report whether the recorded daemon is alive.
    Status,
    /// `stop` followed by `start`.
    Restart,
}

/// A parsed command plus whatever tokens followed it.
#[derive(Debug, Clone)]
pub struct LifecycleInvocation {
    /// The command to run.
    pub command: LifecycleCommand,
    /// Tokens after the command; none are accepted.
    pub arguments: Vec<String>,
}

impl LifecycleInvocation {
    /// Fails when tokens followed the command.
    pub fn ensure_no_extra_arguments(&self) -> Result<(), LifecycleError> {
        if let Some(argument) = self.arguments.first() {
            return Err(LifecycleError::UnexpectedArgument {
                command: self.command,
                argument: argument.clone(),
            });
        }
        Ok(())
    }
}

/// Shared context available to lifecycle handlers.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleContext<'a> {
    /// Loaded configuration.
    pub config: &'a Config,
    /// Pid and log file locations of the managed identity.
    pub paths: &'a DaemonPaths,
    /// `argv[0]` followed by the configuration flags, forwarded to the daemon.
    pub config_arguments: &'a [OsString],
    /// Executable to launch instead of the current one.
    pub daemon_binary: Option<&'a OsStr>,
}

/// Output handle abstracting over stdout/stderr writers.
pub struct LifecycleOutput<W: Write, E: Write> {
    /// Status lines.
    pub stdout: W,
    /// Failure details.
    pub stderr: E,
}

impl<W: Write, E: Write> LifecycleOutput<W, E> {
    /// Wraps a pair of writers.
    pub const fn new(stdout: W, stderr: E) -> Self {
        Self { stdout, stderr }
    }

    /// Writes one line to stdout and flushes it.
    pub fn stdout_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stdout.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stdout.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stdout.flush().map_err(LifecycleError::Io)
    }

    /// Writes one line to stderr and flushes it.
    pub fn stderr_line(&mut self, args: fmt::Arguments<'_>) -> Result<(), LifecycleError> {
        self.stderr.write_fmt(args).map_err(LifecycleError::Io)?;
        self.stderr.write_all(b"\n").map_err(LifecycleError::Io)?;
        self.stderr.flush().map_err(LifecycleError::Io)
    }
}
