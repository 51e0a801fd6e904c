//! The fixture lifecycle state machine.

use std::fmt;
use std::sync::Arc;

use gantry_common::{FixtureError, FixtureResult, ResultExt};
use gantry_db::{RusqliteBackend, SqlBackend};
use gantry_launcher::{await_ready, ProcessLauncher};
use tracing::{debug, info, warn};

use crate::config::{FixtureConfig, UnitTest, DEFAULT_WAIT_TIMEOUT};

/// Lifecycle phase of a [`Fixture`].
///
/// `SetupAttempted` doubles as the error sink for a failed setup: the
/// fixture can no longer reach `Ready`, but teardown and close remain
/// legal so resources can still be reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, setup not yet called.
    Created,
    /// Setup has started (and possibly failed); it may not be called again.
    SetupAttempted,
    /// Setup completed; per-test phases are legal.
    Ready,
    /// Teardown has started; only close is useful from here.
    TornDown,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Created => write!(f, "created"),
            Phase::SetupAttempted => write!(f, "setup_attempted"),
            Phase::Ready => write!(f, "ready"),
            Phase::TornDown => write!(f, "torn_down"),
        }
    }
}

/// Orchestrates one test-process lifecycle.
///
/// Phases run sequentially on the caller's task: `setup` once, then any
/// number of `test_setup`/`test_teardown` pairs, then `teardown` once,
/// with `close` as the guaranteed-cleanup backstop. The fixture is not
/// designed for concurrent invocation of its own methods and is not
/// reusable after `close`.
pub struct Fixture {
    config: FixtureConfig,
    launcher: ProcessLauncher,
    backend: Arc<dyn SqlBackend>,
    test_setups: Vec<UnitTest>,
    test_teardowns: Vec<UnitTest>,
    phase: Phase,
}

impl Fixture {
    /// Validate `config` and construct a fixture in the `Created` phase.
    ///
    /// Configuration errors are raised here, never during a phase: the
    /// application root must be set, absolute and an existing directory,
    /// and the ready line must be non-empty. A zero wait timeout is
    /// normalized to 10 seconds.
    pub fn new(config: FixtureConfig) -> FixtureResult<Self> {
        Self::with_backend(config, Arc::new(RusqliteBackend))
    }

    /// Like [`Fixture::new`] with an explicit SQL backend, used to inject
    /// test doubles.
    pub fn with_backend(
        mut config: FixtureConfig,
        backend: Arc<dyn SqlBackend>,
    ) -> FixtureResult<Self> {
        if config.app_root.as_os_str().is_empty() {
            return Err(FixtureError::configuration("app_root is missing"));
        }

        if !config.app_root.is_absolute() {
            return Err(FixtureError::configuration(
                "app_root must be an absolute path",
            ));
        }

        match std::fs::metadata(&config.app_root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(FixtureError::configuration(
                    "app_root is not a directory",
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FixtureError::configuration(
                    "app_root directory does not exist",
                ));
            }
            Err(e) => {
                return Err(FixtureError::configuration(format!(
                    "could not check app_root: {}",
                    e
                )));
            }
        }

        if config.app.ready_line.is_empty() {
            return Err(FixtureError::configuration(
                "app.ready_line has not been set",
            ));
        }

        if config.app.wait_timeout.is_zero() {
            config.app.wait_timeout = DEFAULT_WAIT_TIMEOUT;
        }

        let launcher = ProcessLauncher::new(
            config.app_root.clone(),
            config.app.build.clone(),
            config.app.run_args.clone(),
        );

        Ok(Self {
            config,
            launcher,
            backend,
            test_setups: Vec::new(),
            test_teardowns: Vec::new(),
            phase: Phase::Created,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Path of the built executable, while it exists on disk.
    pub fn executable_path(&self) -> Option<&std::path::Path> {
        self.launcher.exe_path()
    }

    /// Register a routine to run at the start of each individual test.
    pub fn add_test_setup(&mut self, setup: UnitTest) {
        self.test_setups.push(setup);
    }

    /// Register a routine to run at the end of each individual test.
    pub fn add_test_teardown(&mut self, teardown: UnitTest) {
        self.test_teardowns.push(teardown);
    }

    /// Run the whole-suite setup: database setups, build, start, then
    /// block until the application reports ready.
    ///
    /// Legal exactly once. The phase advances before any work starts, so
    /// a second call fails fast with no side effects. On a readiness
    /// timeout the process is left running; call [`Fixture::close`] to
    /// reap it.
    pub async fn setup(&mut self) -> FixtureResult<()> {
        if self.phase != Phase::Created {
            return Err(FixtureError::invalid_phase(
                "setup()",
                "setup() has already been called; run it only once for the test suite",
            ));
        }
        self.phase = Phase::SetupAttempted;

        info!(app_root = %self.config.app_root.display(), "fixture setup starting");

        for (i, routine) in self.config.database_setups.iter().enumerate() {
            routine
                .run(&self.config.app_root, self.backend.as_ref())
                .context(format!("Error running database setup at index {}", i))?;
        }

        self.launcher.build().await?;
        let (stdout, stderr) = self.launcher.start().await?;

        await_ready(
            stdout,
            stderr,
            &self.config.app.ready_line,
            self.config.app.wait_timeout,
        )
        .await?;

        self.phase = Phase::Ready;
        info!("fixture setup complete, application is ready");
        Ok(())
    }

    /// Run every registered test-setup routine, in registration order.
    /// Call at the start of each individual test.
    pub fn test_setup(&mut self) -> FixtureResult<()> {
        self.check_ready("test_setup()")?;
        Self::run_unit_tests(
            &self.test_setups,
            "test setup",
            &self.config,
            self.backend.as_ref(),
        )
    }

    /// Run every registered test-teardown routine, in registration order.
    /// Call at the end of each individual test.
    pub fn test_teardown(&mut self) -> FixtureResult<()> {
        self.check_ready("test_teardown()")?;
        Self::run_unit_tests(
            &self.test_teardowns,
            "test teardown",
            &self.config,
            self.backend.as_ref(),
        )
    }

    /// Run the whole-suite teardown: kill the process, delete the built
    /// executable, then run the database teardowns.
    ///
    /// Legal exactly once, and only after setup has been attempted. The
    /// phase advances before any work starts; a failed teardown is not
    /// retryable and its remaining steps are skipped.
    pub async fn teardown(&mut self) -> FixtureResult<()> {
        match self.phase {
            Phase::Created => {
                return Err(FixtureError::invalid_phase(
                    "teardown()",
                    "run setup() first",
                ));
            }
            Phase::TornDown => {
                return Err(FixtureError::invalid_phase(
                    "teardown()",
                    "teardown() has already been called; run it only once for the test suite",
                ));
            }
            Phase::SetupAttempted | Phase::Ready => {}
        }
        self.phase = Phase::TornDown;

        info!("fixture teardown starting");

        self.launcher.kill().await?;
        self.launcher.remove_executable()?;

        for (i, routine) in self.config.database_teardowns.iter().enumerate() {
            routine
                .run(&self.config.app_root, self.backend.as_ref())
                .context(format!("Error running database teardown at index {}", i))?;
        }

        info!("fixture teardown complete");
        Ok(())
    }

    /// Best-effort cleanup; never returns an error.
    ///
    /// If teardown was never attempted it is attempted now with its error
    /// swallowed; the process is then killed and the executable deleted
    /// unconditionally (both idempotent no-ops if already gone). Intended
    /// for a deferred/guaranteed-run cleanup path, so a caller that
    /// forgets or fails teardown still cannot leak a process or a file.
    pub async fn close(&mut self) {
        debug!(phase = %self.phase, "fixture close");

        if self.phase != Phase::TornDown {
            if let Err(e) = self.teardown().await {
                warn!(error = %e, "teardown during close failed, continuing cleanup");
            }
        }

        self.launcher.kill_best_effort().await;
        self.launcher.remove_executable_best_effort();
    }

    fn check_ready(&self, operation: &str) -> FixtureResult<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Created => Err(FixtureError::invalid_phase(operation, "run setup() first")),
            Phase::SetupAttempted => Err(FixtureError::invalid_phase(
                operation,
                "setup() did not complete successfully",
            )),
            Phase::TornDown => Err(FixtureError::invalid_phase(
                operation,
                "fixture has already been torn down",
            )),
        }
    }

    fn run_unit_tests(
        unit_tests: &[UnitTest],
        kind: &str,
        config: &FixtureConfig,
        backend: &dyn SqlBackend,
    ) -> FixtureResult<()> {
        for (i, unit_test) in unit_tests.iter().enumerate() {
            for (db_index, routine) in unit_test.database_routines.iter().enumerate() {
                routine.run(&config.app_root, backend).context(format!(
                    "Error running database routine at index {} for {} at index {}",
                    db_index, kind, i
                ))?;
            }

            if let Some(callback) = &unit_test.callback {
                debug!(kind, index = i, "invoking unit test callback");
                callback();
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("app_root", &self.config.app_root)
            .field("phase", &self.phase)
            .field("test_setups", &self.test_setups.len())
            .field("test_teardowns", &self.test_teardowns.len())
            .finish()
    }
}
