//! SQL execution seam.
//!
//! The script runner only needs "open a connection, execute a command
//! string, report success or failure". That contract lives behind the
//! [`SqlBackend`] trait so the fixture can ship with a real engine while
//! tests substitute recording fakes.

use gantry_common::{FixtureError, FixtureResult};

use crate::routine::DbConn;

/// Opaque error type returned by connection implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// A live database connection, scoped to one routine invocation.
pub trait SqlConnection: std::fmt::Debug {
    /// Execute a single command string.
    fn execute(&mut self, command: &str) -> Result<(), BackendError>;
}

/// Opens connections for a driver/connection-string pair.
pub trait SqlBackend: Send + Sync {
    /// Open a connection described by `conn`. The connection is dropped
    /// when the routine that requested it finishes, on every exit path.
    fn connect(&self, conn: &DbConn) -> FixtureResult<Box<dyn SqlConnection>>;
}

/// Backend backed by rusqlite. Handles the `sqlite` and `sqlite3`
/// drivers; the connection string is a database path or `:memory:`.
#[derive(Debug, Default)]
pub struct RusqliteBackend;

impl SqlBackend for RusqliteBackend {
    fn connect(&self, conn: &DbConn) -> FixtureResult<Box<dyn SqlConnection>> {
        match conn.driver.as_str() {
            "sqlite" | "sqlite3" => {
                let connection = rusqlite::Connection::open(&conn.url)
                    .map_err(|e| FixtureError::connection(&conn.driver, e.to_string()))?;
                Ok(Box::new(RusqliteConnection { connection }))
            }
            other => Err(FixtureError::connection(
                other,
                "unknown driver, expected \"sqlite\" or \"sqlite3\"",
            )),
        }
    }
}

#[derive(Debug)]
struct RusqliteConnection {
    connection: rusqlite::Connection,
}

impl SqlConnection for RusqliteConnection {
    fn execute(&mut self, command: &str) -> Result<(), BackendError> {
        self.connection.execute_batch(command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> DbConn {
        DbConn {
            driver: "sqlite".to_string(),
            url: ":memory:".to_string(),
        }
    }

    #[test]
    fn test_rusqlite_executes_commands() {
        let backend = RusqliteBackend;
        let mut conn = backend.connect(&memory_conn()).unwrap();
        conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        conn.execute("INSERT INTO users (name) VALUES ('alice')")
            .unwrap();
    }

    #[test]
    fn test_rusqlite_reports_bad_sql() {
        let backend = RusqliteBackend;
        let mut conn = backend.connect(&memory_conn()).unwrap();
        assert!(conn.execute("NOT VALID SQL").is_err());
    }

    #[test]
    fn test_unknown_driver_is_connection_error() {
        let backend = RusqliteBackend;
        let conn = DbConn {
            driver: "postgres".to_string(),
            url: "postgres://localhost".to_string(),
        };
        let err = backend.connect(&conn).unwrap_err();
        assert!(matches!(err, FixtureError::Connection { .. }));
    }
}
