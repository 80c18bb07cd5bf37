//! Per-actor mobile state.

use std::collections::VecDeque;

use smallvec::smallvec;

use rts_core::{CPos, LocomotorId, MovementType, SubCell, WAngle, WPos};
use rts_spatial::{OccupiedCells, OccupySpace};

use crate::activity::MoveActivity;

/// Default base speed: half a cell per tick.
pub const DEFAULT_SPEED: i32 = 512;
/// Default turn rate in angle units per tick.
pub const DEFAULT_TURN_SPEED: i32 = 128;

// ── MobileInfo ────────────────────────────────────────────────────────────────

/// Static per-type mobile configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MobileInfo {
    pub locomotor:             LocomotorId,
    /// World units per tick on 100 % terrain.
    pub speed:                 i32,
    pub turn_speed:            i32,
    pub initial_facing:        WAngle,
    /// Delay before a move directive searches its path (average ± spread).
    pub pathing_delay_average: i32,
    pub pathing_delay_spread:  i32,
    /// Never yields to nudges and blocks `Immovable` checks.
    pub immovable:             bool,
}

impl MobileInfo {
    pub fn new(locomotor: LocomotorId) -> Self {
        Self {
            locomotor,
            speed:                 DEFAULT_SPEED,
            turn_speed:            DEFAULT_TURN_SPEED,
            initial_facing:        WAngle::NORTH,
            pathing_delay_average: 0,
            pathing_delay_spread:  0,
            immovable:             false,
        }
    }

    pub fn speed(mut self, speed: i32) -> Self {
        self.speed = speed;
        self
    }

    pub fn turn_speed(mut self, turn_speed: i32) -> Self {
        self.turn_speed = turn_speed;
        self
    }

    pub fn facing(mut self, facing: WAngle) -> Self {
        self.initial_facing = facing;
        self
    }

    pub fn pathing_delay(mut self, average: i32, spread: i32) -> Self {
        self.pathing_delay_average = average;
        self.pathing_delay_spread = spread;
        self
    }

    pub fn immovable(mut self, on: bool) -> Self {
        self.immovable = on;
        self
    }
}

// ── MobileStatus ──────────────────────────────────────────────────────────────

/// Trait-level toggle.
///
/// | Status     | Occupies cells | Ticks activities |
/// |------------|----------------|------------------|
/// | `Enabled`  | yes            | yes              |
/// | `Paused`   | yes            | no               |
/// | `Disabled` | no             | no               |
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MobileStatus {
    #[default]
    Enabled,
    Paused,
    Disabled,
}

/// How a mobile is first placed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MobileInit {
    /// A cell and preferred sub-cell; the sub-cell is validated.
    Cell(CPos, SubCell),
    /// A ground world position; cell and sub-cell are derived from it.
    Position(WPos),
}

// ── Mobile ────────────────────────────────────────────────────────────────────

/// Location, facing and motion state of one actor.
///
/// `from_cell == to_cell` (and the sub-cells match) except during the first
/// half of a step, when the actor is leaving `from_cell` for `to_cell`.
/// Location fields are written only by the engine so that the occupancy
/// index always matches [`Mobile::occupied_cells`].
#[derive(Clone, Debug)]
pub struct Mobile {
    pub info: MobileInfo,

    pub(crate) status: MobileStatus,

    pub(crate) from_cell: CPos,
    pub(crate) from_sub:  SubCell,
    pub(crate) to_cell:   CPos,
    pub(crate) to_sub:    SubCell,
    pub(crate) center:    WPos,
    pub(crate) facing:    WAngle,
    pub(crate) in_world:  bool,

    pub(crate) movement_types: MovementType,
    pub(crate) is_blocking:    bool,

    /// Last tick's center and facing, for movement-type derivation.
    pub(crate) old_center: WPos,
    pub(crate) old_facing: WAngle,

    pub(crate) activities: VecDeque<MoveActivity>,
}

impl Mobile {
    pub(crate) fn new(info: MobileInfo, cell: CPos, sub: SubCell, center: WPos) -> Self {
        let facing = info.initial_facing;
        Self {
            info,
            status:         MobileStatus::Enabled,
            from_cell:      cell,
            from_sub:       sub,
            to_cell:        cell,
            to_sub:         sub,
            center,
            facing,
            in_world:       false,
            movement_types: MovementType::NONE,
            is_blocking:    false,
            old_center:     center,
            old_facing:     facing,
            activities:     VecDeque::new(),
        }
    }

    #[inline]
    pub fn from_cell(&self) -> CPos {
        self.from_cell
    }

    #[inline]
    pub fn from_sub_cell(&self) -> SubCell {
        self.from_sub
    }

    #[inline]
    pub fn to_cell(&self) -> CPos {
        self.to_cell
    }

    #[inline]
    pub fn to_sub_cell(&self) -> SubCell {
        self.to_sub
    }

    #[inline]
    pub fn facing(&self) -> WAngle {
        self.facing
    }

    #[inline]
    pub fn is_in_world(&self) -> bool {
        self.in_world
    }

    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.is_blocking
    }

    /// Changed through the engine, which keeps occupancy in step.
    #[inline]
    pub fn status(&self) -> MobileStatus {
        self.status
    }

    /// The cell gameplay logic treats as the actor's location.
    #[inline]
    pub fn top_left(&self) -> CPos {
        self.to_cell
    }

    #[inline]
    pub fn current_movement_types(&self) -> MovementType {
        self.movement_types
    }

    #[inline]
    pub fn is_leaving_cell(&self) -> bool {
        self.from_cell != self.to_cell
    }

    /// Displaced last tick, or mid-step.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.movement_types.is_displacing() || self.is_leaving_cell()
    }

    /// No queued directive and not between cells.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.activities.is_empty() && !self.is_leaving_cell()
    }

    /// The directive currently executing, if any.
    pub fn current_activity(&self) -> Option<&MoveActivity> {
        self.activities.front()
    }

    pub fn queued_activities(&self) -> usize {
        self.activities.len()
    }

    /// May be pushed aside by a nudge.
    #[inline]
    pub fn is_nudgeable(&self) -> bool {
        !self.info.immovable && self.status == MobileStatus::Enabled
    }

    /// Drop queued directives.  A directive in the middle of a step is kept,
    /// cancelled, so the step still reaches a cell center.
    pub(crate) fn cancel_activities(&mut self) {
        self.activities.truncate(1);
        if self.activities.front().is_some_and(MoveActivity::is_between_cells) {
            if let Some(front) = self.activities.front_mut() {
                front.cancel();
            }
        } else {
            self.activities.clear();
        }
        self.is_blocking = false;
    }
}

impl OccupySpace for Mobile {
    /// Derived from location and status only: nothing outside the world or
    /// disabled, one pair when settled, both cells while leaving.
    fn occupied_cells(&self) -> OccupiedCells {
        if !self.in_world || self.status == MobileStatus::Disabled {
            return OccupiedCells::new();
        }
        if self.from_cell == self.to_cell {
            smallvec![(self.from_cell, self.from_sub)]
        } else {
            smallvec![(self.from_cell, self.from_sub), (self.to_cell, self.to_sub)]
        }
    }

    fn center_position(&self) -> WPos {
        self.center
    }
}
