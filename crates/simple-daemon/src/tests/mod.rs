//! Test suites for the daemon runtime and the lifecycle controller.

mod runner;
mod support;
