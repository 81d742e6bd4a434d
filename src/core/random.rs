//! The single source of randomness used by the engine.
//!
//! Every random choice (least-used cell tie-breaks and synapse growth order) goes
//! through [`RandomSource`]. Any `rand` generator implements it, so the engine
//! defaults to a seeded [`StdRng`] while tests can plug in whatever they need.
//! Identical seeds and identical inputs reproduce identical graphs.

use rand::{rngs::StdRng, Rng, SeedableRng};

pub trait RandomSource {
    /// Returns a uniformly distributed index in `0..bound`. `bound` must be non-zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

impl<R: Rng> RandomSource for R {
    #[inline]
    fn next_index(&mut self, bound: usize) -> usize {
        self.random_range(0..bound)
    }
}

/// Creates the default reproducible generator for `seed`.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
