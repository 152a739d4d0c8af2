//! Test doubles shared by the behavioural suites.
//!
//! The daemonizer and shutdown listener replace their system counterparts so
//! the daemon runtime can run on a test thread without forking or signals.

use std::ffi::OsString;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use simple_daemon_config::Config;

use crate::config::ConfigLoader;
use crate::errors::AppError;
use crate::identity::DaemonPaths;
use crate::process::daemonizer::{DaemonizeError, Daemonizer};
use crate::process::shutdown::{ShutdownError, ShutdownSignal};
use crate::task::{DaemonTask, TaskError};

/// Large enough that no real process carries it.
pub(crate) const IMPROBABLE_PID: u32 = 999_999_999;

/// Builds a configuration rooted at `dir` with short timeouts.
pub(crate) fn test_config(dir: &Path) -> Config {
    let working_dir = dir.to_str().expect("temp dir should be UTF-8").to_owned();
    let mut config = Config::default().with_working_dir(working_dir);
    config.startup_timeout_ms = 2_000;
    config.shutdown_timeout_ms = 2_000;
    config.poll_interval_ms = 10;
    config
}

/// A config loader that returns a fixed configuration.
pub(crate) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(crate) const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// How a [`RecordingTask`] behaves once started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TaskBehaviour {
    /// Block until `stop` is called.
    #[default]
    RunUntilStopped,
    /// Return an error straight away.
    FailOnStart,
    /// Keep running for a while after `stop`.
    IgnoreStop,
}

#[derive(Debug, Default)]
struct TaskProbe {
    starts: AtomicUsize,
    stops: AtomicUsize,
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Task double counting its `start` and `stop` calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTask {
    probe: Arc<TaskProbe>,
    behaviour: TaskBehaviour,
}

impl RecordingTask {
    pub(crate) fn with_behaviour(behaviour: TaskBehaviour) -> Self {
        Self {
            probe: Arc::default(),
            behaviour,
        }
    }

    pub(crate) fn starts(&self) -> usize {
        self.probe.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.probe.stops.load(Ordering::SeqCst)
    }

    /// Polls until `start` has been entered.
    pub(crate) fn wait_until_started(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.starts() > 0 {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl DaemonTask for RecordingTask {
    fn start(&self) -> Result<(), TaskError> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            TaskBehaviour::FailOnStart => Err(TaskError::new("task refused to start")),
            TaskBehaviour::IgnoreStop => {
                thread::sleep(Duration::from_secs(3));
                Ok(())
            }
            TaskBehaviour::RunUntilStopped => {
                let mut stopped = self
                    .probe
                    .stopped
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                while !*stopped {
                    stopped = self
                        .probe
                        .wake
                        .wait(stopped)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Ok(())
            }
        }
    }

    fn stop(&self) -> Result<(), TaskError> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        *self
            .probe
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = true;
        self.probe.wake.notify_all();
        Ok(())
    }
}

/// Daemonizer that only counts its invocations.
#[derive(Clone, Default)]
pub(crate) struct TestDaemonizer {
    calls: Arc<AtomicUsize>,
}

impl TestDaemonizer {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Daemonizer for TestDaemonizer {
    fn daemonize(&self, _paths: &DaemonPaths) -> Result<(), DaemonizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Shutdown listener released by [`TestShutdownSignal::trigger`].
#[derive(Clone)]
pub(crate) struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
    installs: Arc<AtomicUsize>,
}

impl TestShutdownSignal {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
            installs: Arc::default(),
        }
    }

    pub(crate) fn triggered() -> Self {
        let signal = Self::new();
        signal.trigger();
        signal
    }

    pub(crate) fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }

    pub(crate) fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn install(&mut self) -> Result<(), ShutdownError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wait(&mut self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}
