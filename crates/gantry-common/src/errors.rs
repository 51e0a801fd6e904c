//! Error types for the gantry test fixture.
//!
//! One enum covers the whole error taxonomy: configuration problems raised
//! at construction, phase-order violations, and the per-step failures of
//! the setup/teardown pipeline. Each variant carries enough context to
//! identify the offending script, path, or sentinel in its message.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for fixture operations.
pub type FixtureResult<T> = std::result::Result<T, FixtureError>;

/// Main error type for fixture operations.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Missing or invalid configuration, raised at construction only.
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// A phase was invoked out of order or more than once.
    #[error("{operation} not allowed: {reason}")]
    InvalidPhase { operation: String, reason: String },

    /// A database script failed. `script` is the truncated literal text
    /// or the resolved file path.
    #[error("Error running script \"{script}\": {reason}")]
    Script { script: String, reason: String },

    /// A glob pattern could not be expanded.
    #[error("Error resolving script files from pattern \"{pattern}\": {reason}")]
    Glob { pattern: String, reason: String },

    /// A database connection could not be opened.
    #[error("Error connecting to database ({driver}): {reason}")]
    Connection { driver: String, reason: String },

    /// The build invocation failed to start or exited non-zero.
    #[error("Error building program: {reason}")]
    Build { reason: String },

    /// The run invocation could not start or its stream handles were
    /// unavailable.
    #[error("Error launching program: {reason}")]
    Launch { reason: String },

    /// Neither output stream produced the sentinel line within the
    /// deadline. The process is still running.
    #[error("Timeout after {timeout:?} waiting for program to start. Was looking for output line \"{line}\"")]
    ReadyTimeout { line: String, timeout: Duration },

    /// The process could not be terminated.
    #[error("Error shutting down program: {reason}")]
    Kill { reason: String },

    /// The built executable could not be deleted.
    #[error("Error deleting built executable {path:?}: {reason}")]
    Cleanup { path: PathBuf, reason: String },

    /// Generic error with context.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        source: Box<FixtureError>,
    },
}

impl FixtureError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn invalid_phase(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPhase {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn script(script: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Script {
            script: script.into(),
            reason: reason.into(),
        }
    }

    pub fn glob(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Glob {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    pub fn connection(driver: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            driver: driver.into(),
            reason: reason.into(),
        }
    }

    pub fn build(reason: impl Into<String>) -> Self {
        Self::Build {
            reason: reason.into(),
        }
    }

    pub fn launch(reason: impl Into<String>) -> Self {
        Self::Launch {
            reason: reason.into(),
        }
    }

    pub fn ready_timeout(line: impl Into<String>, timeout: Duration) -> Self {
        Self::ReadyTimeout {
            line: line.into(),
            timeout,
        }
    }

    pub fn kill(reason: impl Into<String>) -> Self {
        Self::Kill {
            reason: reason.into(),
        }
    }

    pub fn cleanup(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Cleanup {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Adds context to an error.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }
}

/// Convenience methods for fixture results.
pub trait ResultExt<T> {
    /// Adds context to an error result.
    fn context(self, message: impl Into<String>) -> FixtureResult<T>;
}

impl<T> ResultExt<T> for FixtureResult<T> {
    fn context(self, message: impl Into<String>) -> FixtureResult<T> {
        self.map_err(|e| e.context(message))
    }
}
