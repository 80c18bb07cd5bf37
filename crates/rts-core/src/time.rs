//! Simulation time model.
//!
//! Time is a monotonically increasing `Tick` counter advanced once per
//! lockstep frame.  The mapping to game time is held in `SimClock`:
//!
//!   elapsed_ms = tick * timestep_ms
//!
//! Everything in the movement core is expressed per tick (speeds are world
//! units per tick, waits are tick counts), so the timestep only matters to
//! presentation layers.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and converts it to elapsed game time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Milliseconds of game time per tick.
    pub timestep_ms:  u32,
    /// The current tick, advanced by `SimClock::advance()` each frame.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(timestep_ms: u32) -> Self {
        Self { timestep_ms, current_tick: Tick::ZERO }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick + 1;
    }

    /// Elapsed game time since tick 0.
    #[inline]
    pub fn elapsed_ms(&self) -> u64 {
        self.current_tick.0 * self.timestep_ms as u64
    }

    /// Ticks needed to cover `ms` of game time (rounds up).
    #[inline]
    pub fn ticks_for_ms(&self, ms: u64) -> u64 {
        ms.div_ceil(self.timestep_ms.max(1) as u64)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed_ms() / 1000;
        write!(f, "{} ({:02}:{:02})", self.current_tick, secs / 60, secs % 60)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level simulation configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Total ticks to simulate when using `World::run`.
    pub total_ticks: u64,

    /// Master RNG seed.  Every peer must use the same value.
    pub seed: u64,

    /// Game time per tick.  Default: 40 ms (25 ticks per second).
    pub timestep_ms: u32,

    /// Call `on_snapshot` every N ticks.  `0` disables snapshots.
    pub snapshot_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_ticks:             0,
            seed:                    0,
            timestep_ms:             40,
            snapshot_interval_ticks: 0,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.timestep_ms)
    }
}
