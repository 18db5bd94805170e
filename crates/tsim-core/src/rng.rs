//! Deterministic run-level RNG wrapper.
//!
//! # Determinism strategy
//!
//! Every random decision in a run (today: rerouting candidate sampling) draws
//! from a `SimRng` seeded from `StrategyConfig::seed`.  The kernel itself
//! never consumes randomness, so the same seed and inputs always reproduce
//! the same event log.

use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Simulation-level RNG for strategy decisions.
///
/// Used only from the single scheduler thread.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Choose a random element from a slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
