//! Controller side of the daemon lifecycle.
//!
//! - [`types`] defines the command model and IO helpers.
//! - [`error`] captures the error surface shown on the console.
//! - [`spawning`] re-invokes the current executable as the daemon.
//! - [`monitoring`] polls the pid file until the daemon is up.
//! - [`shutdown`] signals the daemon and waits for it to go away.
//! - [`controller`] implements start, stop, status and restart.

mod controller;
mod error;
mod monitoring;
mod shutdown;
mod spawning;
mod types;

pub use controller::SystemLifecycle;
pub use error::LifecycleError;
pub use types::{
    LifecycleCommand, LifecycleContext, LifecycleInvocation, LifecycleOutput, USAGE,
};
