//! Run any long-lived task as a classic Unix daemon.
//!
//! A binary implements [`DaemonTask`] and hands it to [`daemonize`]. The
//! first command-line token after the configuration flags selects the
//! lifecycle command:
//!
//! - `start` re-invokes the executable, which detaches (fork, `setsid`, fork),
//!   records its pid in `<identifier>.pid` and runs the task until a
//!   termination signal arrives. Output is appended to `<identifier>.log`.
//! - `stop` removes the pid file and sends SIGTERM to the recorded process.
//! - `status` reports whether the recorded process is alive.
//! - `restart` runs `stop` then `start`.
//!
//! The identifier is derived from the task's type name, so `HeartbeatWorker`
//! keeps its files at `heartbeat_worker.pid` and `heartbeat_worker.log` in
//! the configured working directory. Configuration is layered by
//! [`simple_daemon_config`].
//!
//! Setting `SIMPLE_DAEMON_FOREGROUND` makes `start` run the task in the
//! current process without detaching.

use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::process::ExitCode;

mod config;
mod errors;
mod identity;
mod lifecycle;
mod process;
mod registry;
mod task;
mod telemetry;

use config::{ConfigArgumentSplit, ConfigLoader, OrthoConfigLoader, split_config_arguments};
use errors::AppError;
pub use identity::{DaemonPaths, Identity, underscore};
pub use lifecycle::{
    LifecycleCommand, LifecycleContext, LifecycleError, LifecycleInvocation, LifecycleOutput,
    SystemLifecycle, USAGE,
};
pub use process::{
    DETACH_ENV_VAR, DaemonizeError, FOREGROUND_ENV_VAR, LaunchError, LaunchMode, ShutdownError,
    run_detached,
};
pub use registry::{PidFile, RegistryError, process_exists};
pub use simple_daemon_config::{Config, LogFormat, WorkingDirError};
pub use task::{BoxedTaskError, DaemonTask, TaskError};
pub use telemetry::{TelemetryError, TelemetryHandle};

/// Runs `task` under the lifecycle command named on the command line.
///
/// Reads the process arguments, writes status lines to stdout and failures
/// to stderr, and returns the exit code for `main`.
#[must_use]
pub fn daemonize<T: DaemonTask>(task: T) -> ExitCode {
    run(task, env::args_os(), &mut io::stdout(), &mut io::stderr())
}

/// Runs `task` with explicit arguments and output streams.
///
/// `args` starts with the program name, as `std::env::args_os` does.
#[must_use]
pub fn run<T, I, W, E>(task: T, args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    T: DaemonTask,
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    Runner::new(stdout, stderr, &OrthoConfigLoader).run(task, args)
}

struct Runner<'a, W: Write, E: Write, L: ConfigLoader> {
    stdout: &'a mut W,
    stderr: &'a mut E,
    loader: &'a L,
    daemon_binary: Option<&'a OsStr>,
}

impl<'a, W, E, L> Runner<'a, W, E, L>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(stdout: &'a mut W, stderr: &'a mut E, loader: &'a L) -> Self {
        Self {
            stdout,
            stderr,
            loader,
            daemon_binary: None,
        }
    }

    #[cfg(test)]
    fn with_daemon_binary(mut self, daemon_binary: Option<&'a OsStr>) -> Self {
        self.daemon_binary = daemon_binary;
        self
    }

    fn run<T, I>(&mut self, task: T, args: I) -> ExitCode
    where
        T: DaemonTask,
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);
        match self.dispatch(task, &args, &split) {
            Ok(exit_code) => exit_code,
            Err(error) => {
                let _ = writeln!(self.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }

    fn dispatch<T: DaemonTask>(
        &mut self,
        task: T,
        args: &[OsString],
        split: &ConfigArgumentSplit,
    ) -> Result<ExitCode, AppError> {
        if env::var_os(DETACH_ENV_VAR).is_some() {
            let config = self.loader.load(&split.config_arguments)?;
            run_detached(task, &config, LaunchMode::Background)?;
            return Ok(ExitCode::SUCCESS);
        }

        let Some(invocation) = parse_invocation(args, split.command_start) else {
            writeln!(self.stdout, "{USAGE}").map_err(AppError::Output)?;
            return Ok(ExitCode::SUCCESS);
        };
        let config = self.loader.load(&split.config_arguments)?;

        if invocation.command == LifecycleCommand::Start
            && LaunchMode::detect() == LaunchMode::Foreground
        {
            invocation.ensure_no_extra_arguments()?;
            run_detached(task, &config, LaunchMode::Foreground)?;
            return Ok(ExitCode::SUCCESS);
        }

        let paths = DaemonPaths::new(&config, &task.identity());
        let context = LifecycleContext {
            config: &config,
            paths: &paths,
            config_arguments: &split.config_arguments,
            daemon_binary: self.daemon_binary,
        };
        let mut output = LifecycleOutput::new(&mut *self.stdout, &mut *self.stderr);
        SystemLifecycle
            .handle(&invocation, context, &mut output)
            .map_err(AppError::from)
    }
}

/// Parses the command token and collects whatever follows it.
///
/// Returns `None` when the token is missing or names no command.
fn parse_invocation(args: &[OsString], command_start: usize) -> Option<LifecycleInvocation> {
    let mut tokens = args
        .iter()
        .skip(command_start)
        .map(|token| token.to_string_lossy().into_owned());
    let command = tokens.next()?.parse::<LifecycleCommand>().ok()?;
    Some(LifecycleInvocation {
        command,
        arguments: tokens.collect(),
    })
}

#[cfg(test)]
mod tests;
