//! The contract a caller implements to run as a daemon.

use std::error::Error as StdError;

use thiserror::Error;

use crate::identity::Identity;

/// Boxed error type accepted from task implementations.
pub type BoxedTaskError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by a task's `start` or `stop` capability.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
    #[source]
    source: Option<BoxedTaskError>,
}

impl TaskError {
    /// Builds an error carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedTaskError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// A long-running unit of work managed by the lifecycle controller.
///
/// `start` is the daemon body: it runs on its own thread for the productive
/// lifetime of the daemon and is called exactly once per detached process.
/// `stop` is called at most once, from the supervising thread, when a
/// termination signal arrives; it must make `start` return. Both receive
/// `&self`, so shared state needs interior mutability.
pub trait DaemonTask: Send + Sync + 'static {
    /// Name used for the pid and log files.
    ///
    /// Defaults to the identity derived from the implementing type's name.
    fn identity(&self) -> Identity {
        Identity::of::<Self>()
    }

    /// Runs the daemon body until it finishes or `stop` is called.
    fn start(&self) -> Result<(), TaskError>;

    /// Asks a running `start` to unwind.
    fn stop(&self) -> Result<(), TaskError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct QueueDrainer;

    impl DaemonTask for QueueDrainer {
        fn start(&self) -> Result<(), TaskError> {
            Ok(())
        }

        fn stop(&self) -> Result<(), TaskError> {
            Ok(())
        }
    }

    #[test]
    fn default_identity_uses_type_name() {
        assert_eq!(QueueDrainer.identity().as_str(), "queue_drainer");
    }

    #[test]
    fn task_error_exposes_source() {
        let cause = std::io::Error::other("disk on fire");
        let error = TaskError::with_source("poller failed", cause);
        assert_eq!(error.to_string(), "poller failed");
        let source = StdError::source(&error).expect("source should be kept");
        assert_eq!(source.to_string(), "disk on fire");
    }
}
