//! Terrain Cost Table: per-locomotor speed and cost for every terrain type.
//!
//! # Units
//!
//! | Quantity | Meaning                                                   |
//! |----------|-----------------------------------------------------------|
//! | speed    | Percent of the mobile's base speed on this terrain.       |
//! | cost     | Path-search weight.  Defaults to `10000 / speed`.         |
//!
//! A terrain type the locomotor does not list, or lists with speed `0`, is
//! impassable.  The table is indexed by the map's [`TerrainIndex`], so the
//! lookup is a bounds-checked `Vec` read.

use std::fmt;

use rts_core::TerrainIndex;

/// Base of the default cost formula `COST_SCALE / speed`.
pub const COST_SCALE: u32 = 10_000;

// ── MovementCost ──────────────────────────────────────────────────────────────

/// A movement cost, or the impassable sentinel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementCost(u32);

impl MovementCost {
    pub const IMPASSABLE: MovementCost = MovementCost(u32::MAX);
    pub const ZERO:       MovementCost = MovementCost(0);

    /// A finite cost.  `u32::MAX` is reserved and clamps one below it.
    #[inline]
    pub fn new(cost: u32) -> Self {
        MovementCost(cost.min(u32::MAX - 1))
    }

    #[inline]
    pub fn is_passable(self) -> bool {
        self != Self::IMPASSABLE
    }

    /// The raw cost; `None` when impassable.
    #[inline]
    pub fn value(self) -> Option<u32> {
        self.is_passable().then_some(self.0)
    }

    /// Sum of two costs.  Impassable is absorbing.
    pub fn plus(self, extra: u32) -> MovementCost {
        if !self.is_passable() {
            return self;
        }
        MovementCost::new(self.0.saturating_add(extra))
    }

    /// Scale by `num / den`.  Impassable is absorbing.
    pub fn scaled(self, num: u32, den: u32) -> MovementCost {
        if !self.is_passable() || den == 0 {
            return self;
        }
        MovementCost::new((self.0 as u64 * num as u64 / den as u64).min(u32::MAX as u64) as u32)
    }
}

impl fmt::Display for MovementCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(c) => write!(f, "{c}"),
            None => f.write_str("impassable"),
        }
    }
}

// ── TerrainInfo ───────────────────────────────────────────────────────────────

/// Resolved speed and cost for one terrain type.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TerrainInfo {
    pub speed:        u32,
    pub cost:         MovementCost,
    /// Units may cross but never idle here.
    pub transit_only: bool,
}

impl TerrainInfo {
    pub const IMPASSABLE: TerrainInfo = TerrainInfo {
        speed:        0,
        cost:         MovementCost::IMPASSABLE,
        transit_only: false,
    };

    /// Resolve a configured speed and optional explicit pathing cost.
    pub fn new(speed: u32, pathing_cost: Option<u32>, transit_only: bool) -> Self {
        if speed == 0 {
            return Self::IMPASSABLE;
        }
        let cost = MovementCost::new(pathing_cost.unwrap_or(COST_SCALE / speed));
        Self { speed, cost, transit_only }
    }
}

// ── TerrainCostTable ──────────────────────────────────────────────────────────

/// Dense table indexed by [`TerrainIndex`].
#[derive(Clone, Debug, Default)]
pub struct TerrainCostTable {
    entries: Vec<TerrainInfo>,
}

impl TerrainCostTable {
    /// A table with every terrain type impassable.
    pub fn impassable(terrain_count: usize) -> Self {
        Self { entries: vec![TerrainInfo::IMPASSABLE; terrain_count] }
    }

    pub fn set(&mut self, terrain: TerrainIndex, info: TerrainInfo) {
        if let Some(slot) = self.entries.get_mut(terrain.index()) {
            *slot = info;
        }
    }

    /// Info for `terrain`; impassable for invalid or unknown indices.
    #[inline]
    pub fn get(&self, terrain: TerrainIndex) -> TerrainInfo {
        if !terrain.is_valid() {
            return TerrainInfo::IMPASSABLE;
        }
        self.entries.get(terrain.index()).copied().unwrap_or(TerrainInfo::IMPASSABLE)
    }

    #[inline]
    pub fn cost(&self, terrain: TerrainIndex) -> MovementCost {
        self.get(terrain).cost
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
