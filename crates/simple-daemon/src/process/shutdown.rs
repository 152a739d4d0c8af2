use std::io;

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that ask the daemon to stop its task.
pub const TERMINATION_SIGNALS: [i32; 3] = [SIGTERM, SIGINT, SIGQUIT];

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + 'static {
    /// Registers the notification source.
    ///
    /// Called before the pid file is written so a `stop` issued right after
    /// the daemon becomes visible is never lost.
    fn install(&mut self) -> Result<(), ShutdownError>;

    /// Blocks until shutdown should proceed.
    fn wait(&mut self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
#[derive(Default)]
pub struct SystemShutdownSignal {
    signals: Option<Signals>,
}

impl SystemShutdownSignal {
    /// Builds a listener; handlers are registered by [`ShutdownSignal::install`].
    #[must_use]
    pub fn new() -> Self {
        Self { signals: None }
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn install(&mut self) -> Result<(), ShutdownError> {
        if self.signals.is_none() {
            let signals = Signals::new(TERMINATION_SIGNALS)
                .map_err(|source| ShutdownError::Install { source })?;
            self.signals = Some(signals);
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<(), ShutdownError> {
        self.install()?;
        if let Some(signal) = self
            .signals
            .as_mut()
            .and_then(|signals| signals.forever().next())
        {
            info!(
                target: PROCESS_TARGET,
                signal,
                "shutdown signal received"
            );
        }
        Ok(())
    }
}
