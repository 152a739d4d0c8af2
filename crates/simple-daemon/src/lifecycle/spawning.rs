//! Re-invokes the current executable as the detached daemon.
//!
//! The child receives the controller's configuration flags, the `start`
//! command and [`DETACH_ENV_VAR`], so it loads the same configuration and
//! runs the daemon side instead of the controller.

use std::env;
use std::ffi::{OsStr, OsString};
use std::process::{Child, Command, Stdio};

use super::error::LifecycleError;
use super::types::LifecycleCommand;
use crate::process::{DETACH_ENV_VAR, FOREGROUND_ENV_VAR};

/// Spawns the daemon process with the given configuration arguments.
///
/// `config_arguments` starts with `argv[0]`, which is skipped.
pub(super) fn spawn_daemon(
    config_arguments: &[OsString],
    binary_override: Option<&OsStr>,
) -> Result<Child, LifecycleError> {
    let binary = resolve_daemon_binary(binary_override)?;
    let mut command = Command::new(&binary);
    command
        .args(config_arguments.iter().skip(1))
        .arg(LifecycleCommand::Start.to_string())
        .env(DETACH_ENV_VAR, "1")
        .env_remove(FOREGROUND_ENV_VAR)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
        .spawn()
        .map_err(|source| LifecycleError::LaunchDaemon { binary, source })
}

fn resolve_daemon_binary(binary_override: Option<&OsStr>) -> Result<OsString, LifecycleError> {
    match binary_override {
        Some(binary) => Ok(binary.to_os_string()),
        None => env::current_exe()
            .map(OsString::from)
            .map_err(|source| LifecycleError::ResolveBinary { source }),
    }
}
