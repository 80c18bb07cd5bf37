//! The shared deterministic random source.
//!
//! # Determinism strategy
//!
//! A lockstep simulation is replayed independently by every peer, so every
//! random decision that can change game state (crush-warning rolls, nudge
//! target choice, blocked-wait jitter, pathing delays) draws from one
//! `SimRng` owned by the world and consumed in the fixed per-tick actor
//! order.  Nothing in the core reads wall-clock time or thread-local
//! randomness.
//!
//! The generator is ChaCha8, which produces the same stream on every target
//! width.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Simulation-level RNG shared by all actors.
pub struct SimRng(ChaCha8Rng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Uniform integer in `0..max`; `0` if `max <= 0`.
    #[inline]
    pub fn next(&mut self, max: i32) -> i32 {
        if max <= 0 { 0 } else { self.0.gen_range(0..max) }
    }

    /// Uniform integer in `low..high`; `low` if the range is empty.
    #[inline]
    pub fn next_range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low { low } else { self.0.gen_range(low..high) }
    }

    /// `average ± spread`, inclusive on both ends.
    #[inline]
    pub fn jitter(&mut self, average: i32, spread: i32) -> i32 {
        average + self.next_range(-spread, spread + 1)
    }

    /// `true` with probability `percent / 100` (clamped to [0, 100]).
    #[inline]
    pub fn percent(&mut self, percent: u8) -> bool {
        self.next(100) < percent.min(100) as i32
    }

    /// Choose a random element from a slice.  Returns `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
