//! # Gantry Common
//!
//! Shared types and utilities for the gantry end-to-end test fixture.
//!
//! This crate provides the foundational pieces the other gantry crates
//! build upon: the error taxonomy, the result alias, and small helpers
//! for text truncation and executable name generation.

pub mod errors;
pub mod naming;
pub mod text;

// Re-export commonly used items
pub use errors::{FixtureError, FixtureResult, ResultExt};
pub use naming::ExeNameGenerator;
pub use text::truncate;
