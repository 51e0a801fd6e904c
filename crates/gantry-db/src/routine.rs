//! Script routine execution.

use std::path::Path;

use gantry_common::{truncate, FixtureError, FixtureResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::SqlBackend;
use crate::script::Script;

/// Maximum literal script length quoted in error messages.
const SCRIPT_PREVIEW_LEN: usize = 40;

/// Database connection details: a driver identifier and a connection
/// string, interpreted by the configured [`SqlBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConn {
    pub driver: String,
    pub url: String,
}

impl DbConn {
    pub fn new(driver: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            url: url.into(),
        }
    }
}

/// An ordered sequence of scripts run over one connection.
///
/// The connection is acquired when [`DbRoutine::run`] starts and released
/// when it returns, on success or failure alike. Execution stops at the
/// first failing script; the error names the offending script by its
/// truncated literal text or its file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbRoutine {
    pub connection: DbConn,
    pub scripts: Vec<Script>,
}

impl DbRoutine {
    pub fn new(connection: DbConn, scripts: Vec<Script>) -> Self {
        Self {
            connection,
            scripts,
        }
    }

    /// Run every script in order against one freshly opened connection.
    ///
    /// The routine itself is stateless and may be invoked any number of
    /// times; each invocation opens its own connection.
    pub fn run(&self, app_root: &Path, backend: &dyn SqlBackend) -> FixtureResult<()> {
        let mut conn = backend.connect(&self.connection)?;

        for script in &self.scripts {
            match script {
                Script::Literal(command) => {
                    debug!(script = %truncate(command, SCRIPT_PREVIEW_LEN, "..."), "running literal script");
                    conn.execute(command).map_err(|e| {
                        FixtureError::script(
                            truncate(command, SCRIPT_PREVIEW_LEN, "..."),
                            e.to_string(),
                        )
                    })?;
                }
                Script::PathGlob(pattern) => {
                    self.run_glob(pattern, app_root, conn.as_mut())?;
                }
            }
        }

        Ok(())
    }

    fn run_glob(
        &self,
        pattern: &str,
        app_root: &Path,
        conn: &mut dyn crate::backend::SqlConnection,
    ) -> FixtureResult<()> {
        let full_pattern = app_root.join(pattern);
        let full_pattern = full_pattern.to_string_lossy();

        let paths = glob::glob(&full_pattern)
            .map_err(|e| FixtureError::glob(pattern, e.to_string()))?;

        for entry in paths {
            let path = entry.map_err(|e| FixtureError::glob(pattern, e.to_string()))?;

            debug!(path = %path.display(), "running script file");
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| FixtureError::script(path.display().to_string(), e.to_string()))?;

            conn.execute(&contents).map_err(|e| {
                FixtureError::script(path.display().to_string(), e.to_string())
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, SqlConnection};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Backend that records every executed command and fails on a
    /// designated command string.
    struct RecordingBackend {
        executed: Arc<Mutex<Vec<String>>>,
        fail_on: Option<String>,
    }

    impl RecordingBackend {
        fn new(fail_on: Option<&str>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let executed = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    executed: Arc::clone(&executed),
                    fail_on: fail_on.map(str::to_string),
                },
                executed,
            )
        }
    }

    impl SqlBackend for RecordingBackend {
        fn connect(&self, _conn: &DbConn) -> FixtureResult<Box<dyn SqlConnection>> {
            Ok(Box::new(RecordingConnection {
                executed: Arc::clone(&self.executed),
                fail_on: self.fail_on.clone(),
            }))
        }
    }

    #[derive(Debug)]
    struct RecordingConnection {
        executed: Arc<Mutex<Vec<String>>>,
        fail_on: Option<String>,
    }

    impl SqlConnection for RecordingConnection {
        fn execute(&mut self, command: &str) -> Result<(), BackendError> {
            if self.fail_on.as_deref() == Some(command) {
                return Err("simulated failure".into());
            }
            self.executed.lock().push(command.to_string());
            Ok(())
        }
    }

    fn conn() -> DbConn {
        DbConn::new("fake", "fake://test")
    }

    #[test]
    fn test_scripts_run_in_order() {
        let (backend, executed) = RecordingBackend::new(None);
        let routine = DbRoutine::new(
            conn(),
            vec![
                Script::literal("first"),
                Script::literal("second"),
                Script::literal("third"),
            ],
        );

        routine.run(Path::new("/tmp"), &backend).unwrap();
        assert_eq!(*executed.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_failure_aborts_remaining_scripts() {
        let (backend, executed) = RecordingBackend::new(Some("third"));
        let routine = DbRoutine::new(
            conn(),
            vec![
                Script::literal("first"),
                Script::literal("second"),
                Script::literal("third"),
                Script::literal("fourth"),
                Script::literal("fifth"),
            ],
        );

        let err = routine.run(Path::new("/tmp"), &backend).unwrap_err();
        assert!(matches!(err, FixtureError::Script { .. }));
        assert!(err.to_string().contains("third"));

        // Scripts before the failure ran, scripts after it did not.
        assert_eq!(*executed.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_long_literal_is_truncated_in_error() {
        let long_command = "x".repeat(80);
        let (backend, _) = RecordingBackend::new(Some(long_command.as_str()));
        let routine = DbRoutine::new(conn(), vec![Script::literal(&long_command)]);

        let err = routine.run(Path::new("/tmp"), &backend).unwrap_err();
        let preview = format!("{}...", "x".repeat(40));
        assert!(err.to_string().contains(&preview));
    }

    #[test]
    fn test_glob_files_run_in_enumeration_order() {
        let dir = tempfile::tempdir().unwrap();
        let sql_dir = dir.path().join("sql");
        std::fs::create_dir(&sql_dir).unwrap();
        std::fs::write(sql_dir.join("01_users.sql"), "create users").unwrap();
        std::fs::write(sql_dir.join("02_orders.sql"), "create orders").unwrap();

        let (backend, executed) = RecordingBackend::new(None);
        let routine = DbRoutine::new(conn(), vec![Script::path("sql/*.sql")]);

        routine.run(dir.path(), &backend).unwrap();
        assert_eq!(*executed.lock(), vec!["create users", "create orders"]);
    }

    #[test]
    fn test_glob_with_no_matches_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, executed) = RecordingBackend::new(None);
        let routine = DbRoutine::new(conn(), vec![Script::path("missing/*.sql")]);

        routine.run(dir.path(), &backend).unwrap();
        assert!(executed.lock().is_empty());
    }

    #[test]
    fn test_malformed_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, _) = RecordingBackend::new(None);
        let routine = DbRoutine::new(conn(), vec![Script::path("sql/[")]);

        let err = routine.run(dir.path(), &backend).unwrap_err();
        assert!(matches!(err, FixtureError::Glob { .. }));
    }

    #[test]
    fn test_failing_file_script_names_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.sql"), "boom").unwrap();

        let (backend, _) = RecordingBackend::new(Some("boom"));
        let routine = DbRoutine::new(conn(), vec![Script::path("bad.sql")]);

        let err = routine.run(dir.path(), &backend).unwrap_err();
        assert!(err.to_string().contains("bad.sql"));
    }
}
