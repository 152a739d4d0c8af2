//! Daemon-side process supervision: detachment, pid registration and
//! signal-driven shutdown of the task.

pub(crate) mod daemonizer;
mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use daemonizer::DaemonizeError;
pub use errors::LaunchError;
pub use launch::{LaunchMode, run_detached};
pub use shutdown::ShutdownError;

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
/// Makes `start` run the task in the current process.
pub const FOREGROUND_ENV_VAR: &str = "SIMPLE_DAEMON_FOREGROUND";
/// Marks the re-invoked child that should detach and run the task.
pub const DETACH_ENV_VAR: &str = "SIMPLE_DAEMON_DETACHED";
