//! High-level orchestration for daemon lifecycle commands.
//!
//! Every flow reports its outcome as plain console lines. Expected states
//! such as a missing or stale pid file end with a message, not an error.

use std::io::Write;
use std::process::ExitCode;

use super::error::LifecycleError;
use super::monitoring::wait_for_ready;
use super::shutdown::{SignalOutcome, signal_daemon, wait_for_exit};
use super::spawning::spawn_daemon;
use super::types::{LifecycleCommand, LifecycleContext, LifecycleInvocation, LifecycleOutput};
use crate::registry::PidFile;

/// How a `stop` ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StopOutcome {
    /// No pid file was present.
    NotStarted,
    /// The pid file did not hold a pid and was removed.
    InvalidRecord,
    /// The recorded process was already gone; the pid file was removed.
    Stale,
    /// The daemon received SIGTERM and exited.
    Stopped,
}

/// Production lifecycle controller.
#[derive(Debug, Default)]
pub struct SystemLifecycle;

impl SystemLifecycle {
    /// Runs `invocation` against the daemon described by `context`.
    pub fn handle<W: Write, E: Write>(
        &mut self,
        invocation: &LifecycleInvocation,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        invocation.ensure_no_extra_arguments()?;
        match invocation.command {
            LifecycleCommand::Start => self.start(context, output),
            LifecycleCommand::Stop => self.stop(context, output).map(|_| ExitCode::SUCCESS),
            LifecycleCommand::Status => self.status(context, output),
            LifecycleCommand::Restart => self.restart(context, output),
        }
    }

    fn start<W: Write, E: Write>(
        &mut self,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        context.paths.prepare()?;
        let pid_file = PidFile::new(context.paths.pid_path());
        if pid_file.exists() {
            output.stderr_line(format_args!(
                "Pid file {} already exists.  Not starting.",
                pid_file.path().display()
            ))?;
            return Ok(ExitCode::FAILURE);
        }
        let mut child = spawn_daemon(context.config_arguments, context.daemon_binary)?;
        let ready = wait_for_ready(
            &pid_file,
            &mut child,
            context.config.startup_timeout(),
            context.config.poll_interval(),
        );
        match ready {
            Ok(_) => {
                output.stdout_line(format_args!("Daemon started."))?;
                Ok(ExitCode::SUCCESS)
            }
            Err(
                error @ (LifecycleError::StartupFailed { .. }
                | LifecycleError::StartupTimeout { .. }),
            ) => {
                output.stderr_line(format_args!("Daemon failed to start."))?;
                output.stderr_line(format_args!("{error}"))?;
                output.stderr_line(format_args!(
                    "See {} for details.",
                    context.paths.log_path().display()
                ))?;
                Ok(ExitCode::FAILURE)
            }
            Err(other) => Err(other),
        }
    }

    /// Stops the recorded daemon.
    ///
    /// The pid file is removed before the signal is sent, so a later `start`
    /// never sees the old record.
    fn stop<W: Write, E: Write>(
        &mut self,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<StopOutcome, LifecycleError> {
        let pid_file = PidFile::new(context.paths.pid_path());
        if !pid_file.exists() {
            output.stdout_line(format_args!("Pid file not found. Is the daemon started?"))?;
            return Ok(StopOutcome::NotStarted);
        }
        let Some(pid) = pid_file.recall() else {
            pid_file.remove()?;
            output.stdout_line(format_args!(
                "Pid file found, but it did not contain a valid pid; removed it."
            ))?;
            return Ok(StopOutcome::InvalidRecord);
        };
        pid_file.remove()?;
        match signal_daemon(pid)? {
            SignalOutcome::NotRunning => {
                output.stdout_line(format_args!(
                    "Pid file found, but process was not running. The daemon may have died."
                ))?;
                Ok(StopOutcome::Stale)
            }
            SignalOutcome::Delivered => {
                wait_for_exit(
                    pid,
                    context.config.shutdown_timeout(),
                    context.config.poll_interval(),
                )?;
                output.stdout_line(format_args!("Daemon stopped."))?;
                Ok(StopOutcome::Stopped)
            }
        }
    }

    fn status<W: Write, E: Write>(
        &mut self,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        let pid_file = PidFile::new(context.paths.pid_path());
        if !pid_file.exists() {
            output.stdout_line(format_args!("Daemon is not running."))?;
        } else if pid_file.is_sane()? {
            output.stdout_line(format_args!("Daemon is running."))?;
        } else {
            output.stdout_line(format_args!(
                "Pid file found, but process is not present. It may have died."
            ))?;
        }
        Ok(ExitCode::SUCCESS)
    }

    fn restart<W: Write, E: Write>(
        &mut self,
        context: LifecycleContext<'_>,
        output: &mut LifecycleOutput<W, E>,
    ) -> Result<ExitCode, LifecycleError> {
        match self.stop(context, output)? {
            StopOutcome::NotStarted => Ok(ExitCode::SUCCESS),
            StopOutcome::InvalidRecord | StopOutcome::Stale | StopOutcome::Stopped => {
                self.start(context, output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use simple_daemon_config::Config;

    use crate::identity::{DaemonPaths, Identity};

    struct Harness {
        _dir: TempDir,
        config: Config,
        paths: DaemonPaths,
    }

    impl Harness {
        fn context(&self) -> LifecycleContext<'_> {
            LifecycleContext {
                config: &self.config,
                paths: &self.paths,
                config_arguments: &[],
                daemon_binary: None,
            }
        }

        fn pid_file(&self) -> PidFile {
            PidFile::new(self.paths.pid_path())
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let dir = TempDir::new().expect("temp dir");
        let config = Config::default();
        let paths = DaemonPaths::in_dir(dir.path(), &Identity::from_type_name("StopProbe"));
        Harness {
            _dir: dir,
            config,
            paths,
        }
    }

    fn stop_with(harness: &Harness) -> (StopOutcome, String) {
        let mut output = LifecycleOutput::new(Vec::new(), Vec::new());
        let outcome = SystemLifecycle
            .stop(harness.context(), &mut output)
            .expect("stop succeeds");
        (outcome, String::from_utf8(output.stdout).expect("utf8"))
    }

    #[rstest]
    fn stop_without_record_is_not_started(harness: Harness) {
        let (outcome, stdout) = stop_with(&harness);
        assert_eq!(outcome, StopOutcome::NotStarted);
        assert_eq!(stdout, "Pid file not found. Is the daemon started?\n");
    }

    #[rstest]
    fn stop_with_dead_pid_is_stale(harness: Harness) {
        harness.pid_file().store(999_999_999).expect("store pid");
        let (outcome, _) = stop_with(&harness);
        assert_eq!(outcome, StopOutcome::Stale);
        assert!(!harness.pid_file().exists());
    }

    #[rstest]
    #[case("")]
    #[case("garbage")]
    fn stop_with_unparsable_record_removes_it(harness: Harness, #[case] content: &str) {
        fs::write(harness.paths.pid_path(), content).expect("write pid file");
        let (outcome, _) = stop_with(&harness);
        assert_eq!(outcome, StopOutcome::InvalidRecord);
        assert!(!harness.pid_file().exists());
    }

    #[rstest]
    fn pid_zero_record_is_never_signalled(harness: Harness) {
        harness.pid_file().store(0).expect("store pid");
        let (outcome, _) = stop_with(&harness);
        assert_eq!(outcome, StopOutcome::Stale);
    }

    #[rstest]
    fn restart_without_record_does_not_start(harness: Harness) {
        let mut output = LifecycleOutput::new(Vec::new(), Vec::new());
        let invocation = LifecycleInvocation {
            command: LifecycleCommand::Restart,
            arguments: Vec::new(),
        };
        let exit = SystemLifecycle
            .handle(&invocation, harness.context(), &mut output)
            .expect("restart succeeds");
        assert_eq!(exit, ExitCode::SUCCESS);
        assert_eq!(
            String::from_utf8(output.stdout).expect("utf8"),
            "Pid file not found. Is the daemon started?\n"
        );
        assert!(output.stderr.is_empty());
        assert!(!harness.pid_file().exists());
    }

    #[rstest]
    fn status_leaves_stale_record_in_place(harness: Harness) {
        harness.pid_file().store(999_999_999).expect("store pid");
        let mut output = LifecycleOutput::new(Vec::new(), Vec::new());
        let invocation = LifecycleInvocation {
            command: LifecycleCommand::Status,
            arguments: Vec::<String>::new(),
        };
        SystemLifecycle
            .handle(&invocation, harness.context(), &mut output)
            .expect("status succeeds");
        assert!(harness.pid_file().exists());
    }
}
