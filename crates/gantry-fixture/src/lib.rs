//! # Gantry Fixture
//!
//! Lifecycle manager for end-to-end test fixtures.
//!
//! A [`Fixture`] builds and launches the server under test, waits for a
//! sentinel output line to signal readiness, runs database scripts around
//! the whole suite and around each individual test, and guarantees the
//! process and the built executable are cleaned up even when a step
//! fails mid-sequence.
//!
//! Typical shape of a test suite:
//!
//! ```no_run
//! use gantry_db::{DbConn, DbRoutine, Script};
//! use gantry_fixture::{AppSetup, Fixture, FixtureConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> gantry_common::FixtureResult<()> {
//! let mut fixture = Fixture::new(FixtureConfig {
//!     app_root: "/abs/path/to/app".into(),
//!     database_setups: vec![DbRoutine::new(
//!         DbConn::new("sqlite", "/tmp/test.db"),
//!         vec![Script::path("sql/setup/*.sql")],
//!     )],
//!     database_teardowns: vec![],
//!     app: AppSetup {
//!         ready_line: "listening".to_string(),
//!         wait_timeout: Duration::from_secs(5),
//!         ..AppSetup::default()
//!     },
//! })?;
//!
//! fixture.setup().await?;
//! // ... run tests, calling fixture.test_setup() / fixture.test_teardown() ...
//! let teardown_result = fixture.teardown().await;
//! fixture.close().await; // always safe, never errors
//! teardown_result
//! # }
//! ```

pub mod config;
pub mod fixture;

// Re-export commonly used items
pub use config::{AppSetup, FixtureConfig, UnitTest};
pub use fixture::{Fixture, Phase};

// Re-export the building blocks callers need to assemble a config.
pub use gantry_common::{FixtureError, FixtureResult};
pub use gantry_db::{DbConn, DbRoutine, Script, SqlBackend};
pub use gantry_launcher::BuildCommand;
