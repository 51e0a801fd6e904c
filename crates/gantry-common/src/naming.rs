//! Unique executable name generation.
//!
//! The launcher synthesizes a collision-free output path for each built
//! executable so concurrent test runs against the same application root
//! cannot clobber each other. The random source is owned explicitly by
//! the generator rather than living in global state, so tests can seed
//! it for deterministic names.

use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SUFFIX_LEN: usize = 8;

/// Generates unique executable file names of the form `<base>_<suffix>`.
#[derive(Debug)]
pub struct ExeNameGenerator {
    rng: StdRng,
}

impl ExeNameGenerator {
    /// Create a generator seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a generator with a fixed seed, for deterministic tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce the next unique name for the given base name.
    pub fn next_name(&mut self, base: &str) -> String {
        let suffix: String = (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();

        format!("{}_{}", base, suffix)
    }
}

impl Default for ExeNameGenerator {
    fn default() -> Self {
        Self::new()
    }
}
