//! Fixture configuration types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use gantry_db::DbRoutine;
use gantry_launcher::BuildCommand;
use serde::{Deserialize, Serialize};

/// Default readiness wait applied when the configured timeout is zero.
pub(crate) const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for building and running the application under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSetup {
    /// Build invocation. The default is a plain single-file build with a
    /// synthesized output path; see [`BuildCommand`].
    #[serde(default)]
    pub build: BuildCommand,

    /// Command line arguments passed to the built executable.
    #[serde(default)]
    pub run_args: Vec<String>,

    /// The exact output line, on stdout or stderr, that signals the
    /// application is ready to accept traffic. Required.
    pub ready_line: String,

    /// How long to wait for `ready_line`. Zero is normalized to 10 s at
    /// fixture construction.
    #[serde(default)]
    pub wait_timeout: Duration,
}

impl Default for AppSetup {
    fn default() -> Self {
        Self {
            build: BuildCommand::default(),
            run_args: Vec::new(),
            ready_line: String::new(),
            wait_timeout: Duration::ZERO,
        }
    }
}

/// Root configuration for a [`crate::Fixture`].
///
/// Immutable once the fixture is constructed; construction validates the
/// application root and the ready line, and normalizes the wait timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Absolute path to the root of the application under test. Must
    /// exist and be a directory.
    pub app_root: PathBuf,

    /// Database routines run once before the whole suite, in order.
    #[serde(default)]
    pub database_setups: Vec<DbRoutine>,

    /// Database routines run once after the whole suite, in order.
    #[serde(default)]
    pub database_teardowns: Vec<DbRoutine>,

    /// Build/run/readiness settings for the application executable.
    pub app: AppSetup,
}

/// A named bundle of database routines plus an optional callback, run at
/// the start or end of each individual test.
pub struct UnitTest {
    /// Database routines run in order for this unit of work.
    pub database_routines: Vec<DbRoutine>,

    /// Invoked after the routines succeed. `None` is a no-op.
    pub callback: Option<Box<dyn Fn() + Send + Sync>>,
}

impl UnitTest {
    pub fn new(database_routines: Vec<DbRoutine>) -> Self {
        Self {
            database_routines,
            callback: None,
        }
    }

    pub fn with_callback(
        database_routines: Vec<DbRoutine>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            database_routines,
            callback: Some(Box::new(callback)),
        }
    }
}

impl fmt::Debug for UnitTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitTest")
            .field("database_routines", &self.database_routines)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
