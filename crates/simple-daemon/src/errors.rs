//! Error surface of the process entry point.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::process::LaunchError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("daemon lifecycle command failed: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("failed to write console output: {0}")]
    Output(#[source] io::Error),
}
