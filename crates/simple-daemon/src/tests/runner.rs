//! Unit tests for argument handling in the process entry point.

use std::ffi::OsString;
use std::process::ExitCode;

use rstest::rstest;
use tempfile::TempDir;

use simple_daemon_config::Config;

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::lifecycle::{LifecycleCommand, USAGE};
use crate::tests::support::{RecordingTask, StaticConfigLoader, test_config};
use crate::{Runner, parse_invocation};

fn os_args(args: &[&str]) -> Vec<OsString> {
    args.iter().map(OsString::from).collect()
}

struct PanickingLoader;

impl ConfigLoader for PanickingLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        panic!("configuration must not load for invalid commands");
    }
}

struct FailingLoader;

impl ConfigLoader for FailingLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Err(AppError::Output(std::io::Error::other("loader exploded")))
    }
}

#[rstest]
#[case(&["daemon"])]
#[case(&["daemon", "reload"])]
#[case(&["daemon", "--working-dir", "/tmp/x"])]
#[case(&["daemon", "Start"])]
fn invalid_commands_print_usage_without_loading(#[case] args: &[&str]) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = Runner::new(&mut stdout, &mut stderr, &PanickingLoader)
        .run(RecordingTask::default(), os_args(args));
    assert_eq!(exit, ExitCode::SUCCESS);
    assert_eq!(String::from_utf8(stdout).expect("utf8"), format!("{USAGE}\n"));
    assert!(stderr.is_empty());
}

#[test]
fn configuration_failures_are_reported() {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = Runner::new(&mut stdout, &mut stderr, &FailingLoader)
        .run(RecordingTask::default(), os_args(&["daemon", "status"]));
    assert_eq!(exit, ExitCode::FAILURE);
    assert!(
        String::from_utf8(stderr)
            .expect("utf8")
            .contains("loader exploded")
    );
}

#[test]
fn status_creates_nothing_on_disk() {
    let dir = TempDir::new().expect("temp dir");
    let working_dir = dir.path().join("not-yet");
    let loader = StaticConfigLoader::new(test_config(&working_dir));
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = Runner::new(&mut stdout, &mut stderr, &loader)
        .run(RecordingTask::default(), os_args(&["daemon", "status"]));
    assert_eq!(exit, ExitCode::SUCCESS);
    assert!(!working_dir.exists());
}

#[rstest]
#[case(&["daemon", "start"], 1, Some(LifecycleCommand::Start), 0)]
#[case(&["daemon", "--log-filter", "debug", "restart"], 3, Some(LifecycleCommand::Restart), 0)]
#[case(&["daemon", "stop", "--force"], 1, Some(LifecycleCommand::Stop), 1)]
#[case(&["daemon"], 1, None, 0)]
fn parses_command_after_configuration(
    #[case] args: &[&str],
    #[case] command_start: usize,
    #[case] command: Option<LifecycleCommand>,
    #[case] extra: usize,
) {
    let invocation = parse_invocation(&os_args(args), command_start);
    assert_eq!(invocation.as_ref().map(|found| found.command), command);
    assert_eq!(
        invocation.map_or(0, |found| found.arguments.len()),
        extra
    );
}
