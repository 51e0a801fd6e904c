//! # Gantry Launcher
//!
//! Builds and launches the application under test and detects when it is
//! ready to accept traffic.
//!
//! The [`ProcessLauncher`] owns the child process and the built
//! executable's path; it never interprets process output. Interpreting
//! output is the job of [`readiness::await_ready`], which races the two
//! output streams against a timeout.

pub mod launcher;
pub mod readiness;

// Re-export commonly used items
pub use launcher::{BuildCommand, ProcessLauncher};
pub use readiness::await_ready;
