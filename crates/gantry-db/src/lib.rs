//! # Gantry DB
//!
//! Database script model and runner for the gantry test fixture.
//!
//! A [`DbRoutine`] bundles one connection description with an ordered list
//! of [`Script`]s and executes them sequentially over a single connection,
//! stopping at the first failure. The SQL engine itself sits behind the
//! [`SqlBackend`] seam; the shipped backend is rusqlite, and tests inject
//! recording fakes through the same trait.

pub mod backend;
pub mod routine;
pub mod script;

// Re-export commonly used items
pub use backend::{RusqliteBackend, SqlBackend, SqlConnection};
pub use routine::{DbConn, DbRoutine};
pub use script::Script;
