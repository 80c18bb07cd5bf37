//! `Locomotor`: the stateless cost and blocking policy for a class of movers.
//!
//! # Blocking
//!
//! An occupant of a cell blocks a mover unless one of these holds:
//!
//! | Condition                                         | Mode            |
//! |---------------------------------------------------|-----------------|
//! | it is the mover itself or the ignored actor       | any             |
//! | the mode ignores actors                           | `None`          |
//! | it can be nudged out of the way                   | `Immovable`     |
//! | it is moving                                      | `Stationary`    |
//! | the mover's locomotor can crush it                | any             |
//!
//! Terrain is checked before occupancy: an impassable cell answers
//! impassable without consulting the [`ActorMap`].
//!
//! # Context
//!
//! Occupancy questions need the grid, the occupancy index, the actor store
//! (owners, crushable descriptors) and the motion state of other actors.
//! Callers bundle these into a [`MoveContext`]; the motion state reaches the
//! locomotor through the [`MotionView`] trait so this crate does not depend
//! on the mobile layer.

use rts_actor::ActorStore;
use rts_core::{ActorId, CPos, CrushClasses, DamageTypes, LocomotorId, SubCell, TerrainIndex};
use rts_spatial::{ActorMap, Grid};

use crate::terrain::{MovementCost, TerrainCostTable, TerrainInfo};
use crate::{LocomotionError, LocomotionResult};

/// Default blocked-wait ticks.
pub const DEFAULT_WAIT_AVERAGE: i32 = 40;
pub const DEFAULT_WAIT_SPREAD:  i32 = 10;

/// Diagonal steps cost `141 / 100` of an orthogonal step.
const DIAGONAL_NUM: u32 = 141;
const DIAGONAL_DEN: u32 = 100;

// ── BlockingMode ──────────────────────────────────────────────────────────────

/// Which other actors count as obstacles for an occupancy check.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockingMode {
    /// Ignore every other actor.
    None,
    /// Only actors that are not moving block.
    Stationary,
    /// Only actors that cannot be nudged block.
    Immovable,
    /// Every actor blocks.
    #[default]
    All,
}

// ── MotionView ────────────────────────────────────────────────────────────────

/// Motion facts about an actor that blocking rules depend on.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Motion {
    pub is_moving: bool,
    pub nudgeable: bool,
}

/// Read access to the motion state of actors.
pub trait MotionView {
    /// `None` for actors without a mobile (buildings, props).  Those never
    /// move and can never be nudged.
    fn motion(&self, actor: ActorId) -> Option<Motion>;
}

/// A [`MotionView`] in which no actor has a mobile.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoMotion;

impl MotionView for NoMotion {
    fn motion(&self, _actor: ActorId) -> Option<Motion> {
        None
    }
}

/// Everything a locomotor needs to answer occupancy questions.
#[derive(Copy, Clone)]
pub struct MoveContext<'a> {
    pub grid:      &'a Grid,
    pub actor_map: &'a ActorMap,
    pub actors:    &'a ActorStore,
    pub motion:    &'a dyn MotionView,
}

// ── LocomotorInfo ─────────────────────────────────────────────────────────────

/// Configured speed for one terrain type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerrainSpeed {
    pub terrain:      String,
    /// Percent of base speed; `0` is impassable.
    pub speed:        u32,
    pub pathing_cost: Option<u32>,
    pub transit_only: bool,
}

/// Static description of a locomotor.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocomotorInfo {
    pub name:               String,
    /// Movers share cells using sub-cells (infantry).
    pub shares_cell:        bool,
    pub crushes:            CrushClasses,
    pub crush_damage_types: DamageTypes,
    pub terrain_speeds:     Vec<TerrainSpeed>,
    /// Ticks a blocked mover waits before re-pathing (average ± spread).
    pub wait_average:       i32,
    pub wait_spread:        i32,
}

impl LocomotorInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name:               name.to_owned(),
            shares_cell:        false,
            crushes:            CrushClasses::EMPTY,
            crush_damage_types: DamageTypes::EMPTY,
            terrain_speeds:     Vec::new(),
            wait_average:       DEFAULT_WAIT_AVERAGE,
            wait_spread:        DEFAULT_WAIT_SPREAD,
        }
    }

    pub fn shares_cell(mut self, on: bool) -> Self {
        self.shares_cell = on;
        self
    }

    pub fn crushes(mut self, classes: CrushClasses) -> Self {
        self.crushes = classes;
        self
    }

    pub fn crush_damage_types(mut self, types: DamageTypes) -> Self {
        self.crush_damage_types = types;
        self
    }

    /// Traversable terrain at `speed` percent.
    pub fn terrain(self, terrain: &str, speed: u32) -> Self {
        self.push_terrain(terrain, speed, None, false)
    }

    pub fn terrain_with_cost(self, terrain: &str, speed: u32, pathing_cost: u32) -> Self {
        self.push_terrain(terrain, speed, Some(pathing_cost), false)
    }

    /// Terrain that may be crossed but never idled on.
    pub fn transit(self, terrain: &str, speed: u32) -> Self {
        self.push_terrain(terrain, speed, None, true)
    }

    pub fn wait(mut self, average: i32, spread: i32) -> Self {
        self.wait_average = average;
        self.wait_spread = spread;
        self
    }

    fn push_terrain(mut self, terrain: &str, speed: u32, pathing_cost: Option<u32>, transit_only: bool) -> Self {
        self.terrain_speeds.retain(|t| t.terrain != terrain);
        self.terrain_speeds.push(TerrainSpeed {
            terrain: terrain.to_owned(),
            speed,
            pathing_cost,
            transit_only,
        });
        self
    }
}

// ── Locomotor ─────────────────────────────────────────────────────────────────

/// A [`LocomotorInfo`] resolved against a map's terrain types.
#[derive(Clone, Debug)]
pub struct Locomotor {
    info:  LocomotorInfo,
    costs: TerrainCostTable,
}

impl Locomotor {
    /// Resolve `info` against `terrain_types` (the map's terrain list).
    ///
    /// Terrain types the info does not mention are impassable.  Naming a
    /// terrain type the map does not have is an error.
    pub fn new(info: LocomotorInfo, terrain_types: &[String]) -> LocomotionResult<Self> {
        let mut costs = TerrainCostTable::impassable(terrain_types.len());
        for t in &info.terrain_speeds {
            let index = terrain_types
                .iter()
                .position(|name| *name == t.terrain)
                .ok_or_else(|| LocomotionError::UnknownTerrain {
                    locomotor: info.name.clone(),
                    terrain:   t.terrain.clone(),
                })?;
            costs.set(
                TerrainIndex(index as u8),
                TerrainInfo::new(t.speed, t.pathing_cost, t.transit_only),
            );
        }
        Ok(Self { info, costs })
    }

    #[inline]
    pub fn info(&self) -> &LocomotorInfo {
        &self.info
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    #[inline]
    pub fn shares_cell(&self) -> bool {
        self.info.shares_cell
    }

    #[inline]
    pub fn costs(&self) -> &TerrainCostTable {
        &self.costs
    }

    // ── Terrain ───────────────────────────────────────────────────────────

    fn terrain_info(&self, grid: &Grid, cell: CPos) -> TerrainInfo {
        if !grid.contains(cell) {
            return TerrainInfo::IMPASSABLE;
        }
        if let Some(layer) = grid.layer(cell.layer) {
            if !layer.enabled_for_locomotor(self.name()) {
                return TerrainInfo::IMPASSABLE;
            }
        }
        self.costs.get(grid.terrain_index(cell))
    }

    /// Cost of standing in `cell`.  Pure in the terrain and layer of `cell`.
    #[inline]
    pub fn movement_cost_for_cell(&self, grid: &Grid, cell: CPos) -> MovementCost {
        self.terrain_info(grid, cell).cost
    }

    /// Speed percentage on `cell`; `0` where impassable.
    #[inline]
    pub fn speed_for_cell(&self, grid: &Grid, cell: CPos) -> u32 {
        self.terrain_info(grid, cell).speed
    }

    /// `false` for impassable cells, transit-only terrain, and layer cells
    /// that do not allow idling.
    pub fn can_stay_in_cell(&self, grid: &Grid, cell: CPos) -> bool {
        let info = self.terrain_info(grid, cell);
        info.cost.is_passable() && !info.transit_only && grid.allows_idle(cell)
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// `true` if `other` is an obstacle for `mover` under `mode`.
    pub fn is_blocked_by(
        &self,
        ctx: &MoveContext<'_>,
        mover: Option<ActorId>,
        other: ActorId,
        mode: BlockingMode,
        ignore: Option<ActorId>,
    ) -> bool {
        if Some(other) == mover || Some(other) == ignore {
            return false;
        }
        if !ctx.actors.is_alive(other) {
            return false;
        }
        let motion = ctx.motion.motion(other);
        match mode {
            BlockingMode::None => return false,
            BlockingMode::Immovable if motion.is_some_and(|m| m.nudgeable) => return false,
            BlockingMode::Stationary if motion.is_some_and(|m| m.is_moving) => return false,
            _ => {}
        }
        match mover {
            Some(m) => !self.can_crush(ctx.actors, m, other),
            None => true,
        }
    }

    /// `true` if `mover` (using this locomotor) may crush `victim`.
    pub fn can_crush(&self, actors: &ActorStore, mover: ActorId, victim: ActorId) -> bool {
        !self.info.crushes.is_empty() && actors.crushable_by(victim, actors.owner(mover), self.info.crushes)
    }

    /// Terrain passability plus occupancy for `sub` of `cell`.
    ///
    /// For a cell-sharing locomotor `sub` is a slot (or `Any`, meaning "some
    /// free slot"); otherwise the whole cell must be free.
    pub fn can_move_freely_into(
        &self,
        ctx: &MoveContext<'_>,
        mover: Option<ActorId>,
        cell: CPos,
        sub: SubCell,
        mode: BlockingMode,
        ignore: Option<ActorId>,
    ) -> bool {
        if !self.movement_cost_for_cell(ctx.grid, cell).is_passable() {
            return false;
        }
        if mode == BlockingMode::None {
            return true;
        }
        let blocks = |other| self.is_blocked_by(ctx, mover, other, mode, ignore);
        if self.shares_cell() && sub != SubCell::FullCell {
            if sub == SubCell::Any {
                ctx.actor_map.has_free_sub_cell(cell, blocks)
            } else {
                !ctx.actor_map.any_actors_at_filtered(cell, sub, blocks)
            }
        } else {
            !ctx.actor_map.any_actors_at_filtered(cell, SubCell::Any, blocks)
        }
    }

    /// `true` if `mover` could occupy some slot of `cell` right now.
    pub fn can_enter_cell(
        &self,
        ctx: &MoveContext<'_>,
        mover: Option<ActorId>,
        cell: CPos,
        mode: BlockingMode,
        ignore: Option<ActorId>,
    ) -> bool {
        self.available_sub_cell(ctx, mover, cell, SubCell::Any, ignore, mode) != SubCell::Invalid
    }

    /// The slot `mover` would take in `cell`, or `SubCell::Invalid`.
    ///
    /// Non-sharing locomotors answer `FullCell` or `Invalid`.
    pub fn available_sub_cell(
        &self,
        ctx: &MoveContext<'_>,
        mover: Option<ActorId>,
        cell: CPos,
        preferred: SubCell,
        ignore: Option<ActorId>,
        mode: BlockingMode,
    ) -> SubCell {
        if !self.movement_cost_for_cell(ctx.grid, cell).is_passable() {
            return SubCell::Invalid;
        }
        if !self.shares_cell() {
            let blocked = mode != BlockingMode::None
                && ctx
                    .actor_map
                    .any_actors_at_filtered(cell, SubCell::Any, |o| self.is_blocked_by(ctx, mover, o, mode, ignore));
            return if blocked { SubCell::Invalid } else { SubCell::FullCell };
        }
        if mode == BlockingMode::None {
            return match preferred {
                SubCell::Index(_) => preferred,
                _ => ctx.grid.map.default_sub_cell(),
            };
        }
        ctx.actor_map
            .free_sub_cell(cell, preferred, |o| self.is_blocked_by(ctx, mover, o, mode, ignore))
    }

    /// Cost of stepping from `from` into the adjacent (or same-`(x, y)`,
    /// other-layer) cell `to`.
    ///
    /// Adds the layer's entry or exit cost on layer transitions and scales
    /// diagonal steps by 141/100.  Impassable when `to` is blocked under
    /// `mode`.
    pub fn movement_cost_to_enter_cell(
        &self,
        ctx: &MoveContext<'_>,
        mover: Option<ActorId>,
        from: CPos,
        to: CPos,
        mode: BlockingMode,
        ignore: Option<ActorId>,
    ) -> MovementCost {
        let cost = self.movement_cost_for_cell(ctx.grid, to);
        if !cost.is_passable() {
            return cost;
        }

        let cost = if from.layer != to.layer {
            match self.transition_cost(ctx.grid, from, to) {
                Some(extra) => cost.plus(extra),
                None => return MovementCost::IMPASSABLE,
            }
        } else if (to - from).is_diagonal() {
            cost.scaled(DIAGONAL_NUM, DIAGONAL_DEN)
        } else {
            cost
        };

        if !self.can_move_freely_into(ctx, mover, to, SubCell::Any, mode, ignore) {
            return MovementCost::IMPASSABLE;
        }
        cost
    }

    /// Entry cost onto a custom layer or exit cost back to the ground.
    /// Layer-to-layer and cross-cell transitions are not allowed.
    fn transition_cost(&self, grid: &Grid, from: CPos, to: CPos) -> Option<u32> {
        if (from.x, from.y) != (to.x, to.y) {
            return None;
        }
        match (from.layer, to.layer) {
            (0, l) => grid.layer(l)?.entry_movement_cost(self.name(), to),
            (l, 0) => grid.layer(l)?.exit_movement_cost(self.name(), from),
            _ => None,
        }
    }
}

// ── LocomotorSet ──────────────────────────────────────────────────────────────

/// Every locomotor of a world, addressed by [`LocomotorId`].
#[derive(Clone, Debug, Default)]
pub struct LocomotorSet {
    locomotors: Vec<Locomotor>,
}

impl LocomotorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a batch of infos (for example from the CSV loader).
    pub fn from_infos(infos: Vec<LocomotorInfo>, terrain_types: &[String]) -> LocomotionResult<Self> {
        let mut set = Self::new();
        for info in infos {
            set.add(Locomotor::new(info, terrain_types)?)?;
        }
        Ok(set)
    }

    pub fn add(&mut self, locomotor: Locomotor) -> LocomotionResult<LocomotorId> {
        if self.by_name(locomotor.name()).is_some() {
            return Err(LocomotionError::DuplicateLocomotor(locomotor.name().to_owned()));
        }
        let id = LocomotorId::try_from(self.locomotors.len())
            .map_err(|_| LocomotionError::TooManyLocomotors)?;
        self.locomotors.push(locomotor);
        Ok(id)
    }

    #[inline]
    pub fn get(&self, id: LocomotorId) -> Option<&Locomotor> {
        self.locomotors.get(id.index())
    }

    pub fn by_name(&self, name: &str) -> Option<LocomotorId> {
        self.locomotors
            .iter()
            .position(|l| l.name() == name)
            .map(|i| LocomotorId(i as u16))
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocomotorId, &Locomotor)> {
        self.locomotors.iter().enumerate().map(|(i, l)| (LocomotorId(i as u16), l))
    }

    pub fn len(&self) -> usize {
        self.locomotors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locomotors.is_empty()
    }
}
