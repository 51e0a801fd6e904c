//! Database script representation.

use serde::{Deserialize, Serialize};

/// A unit of database work, run as part of a setup or teardown routine.
///
/// A script is either literal command text, or a glob pattern naming one
/// or more command files. Patterns resolve at execution time relative to
/// the application root; each matched file's contents are executed as one
/// command, in glob enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Literal command text executed as-is.
    Literal(String),
    /// Glob pattern for command files, relative to the application root.
    PathGlob(String),
}

impl Script {
    /// A script holding literal command text.
    pub fn literal(command: impl Into<String>) -> Self {
        Self::Literal(command.into())
    }

    /// A script holding a glob pattern for command files.
    pub fn path(pattern: impl Into<String>) -> Self {
        Self::PathGlob(pattern.into())
    }
}
