//! `MoveActivity`: a cancellable, resumable move directive.
//!
//! # Step anatomy
//!
//! Each step into the next path cell is two half-moves:
//!
//! | Phase        | Motion                            | Occupancy                         |
//! |--------------|-----------------------------------|-----------------------------------|
//! | start        | turn to face the next cell        | `from == to`                      |
//! | first half   | own center → edge midpoint        | both cells (`from != to`)         |
//! | midpoint     | `SetLocation(to, to)`             | next cell only                    |
//! | second half  | edge midpoint → next center       | next cell only                    |
//! | end          | `FinishedMoving` (crush, events)  | next cell only                    |
//!
//! The path is searched lazily, after the mobile's pathing delay, by the
//! engine's [`PathFinder`].  A cancelled directive drops its remaining path
//! but finishes the half-move in progress, so the actor always comes to rest
//! on a cell center.
//!
//! # Blocking
//!
//! When the next cell cannot be entered the directive ends if the actor is
//! already within `near_enough` of the target.  Otherwise it marks the actor
//! as blocking, asks the blockers to move aside (once per wait), waits
//! `wait_average ± wait_spread` ticks, and then searches again treating every
//! actor as an obstacle.

use std::collections::VecDeque;

use log::{debug, trace};

use rts_core::{ActorId, CPos, SubCell, WAngle, WPos};
use rts_locomotion::{BlockingMode, PathFinder};

use crate::nudge::NudgeCause;
use crate::{Mobile, MobileEngine, MobileResult};

/// Search radius (cells) when retargeting to a nearby enterable cell.
pub const NEAREST_CELL_RANGE: i32 = 10;

/// Upper bound on phase changes within one tick.
const MAX_TRANSITIONS_PER_TICK: usize = 8;

// ── HalfMove ──────────────────────────────────────────────────────────────────

/// Straight-line motion between two world positions at a fixed rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct HalfMove {
    start:    WPos,
    end:      WPos,
    length:   i32,
    progress: i32,
}

impl HalfMove {
    fn new(start: WPos, end: WPos) -> Self {
        Self {
            start,
            end,
            length:   (end - start).length() as i32,
            progress: 0,
        }
    }

    /// Spend as much of `budget` as this half needs and return the new
    /// position.
    fn advance(&mut self, budget: &mut i32) -> WPos {
        let step = (self.length - self.progress).min(*budget).max(0);
        self.progress += step;
        *budget -= step;
        if self.is_done() {
            self.end
        } else {
            WPos::lerp(self.start, self.end, self.progress as i64, self.length as i64)
        }
    }

    fn is_done(&self) -> bool {
        self.progress >= self.length
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum MovePhase {
    AtCenter,
    /// `origin` is the cell the step started from.
    FirstHalf { half: HalfMove, origin: CPos },
    SecondHalf { half: HalfMove, origin: CPos },
}

// ── MoveActivity ──────────────────────────────────────────────────────────────

/// A queued "move to `target`" directive.
#[derive(Clone, Debug)]
pub struct MoveActivity {
    target:        CPos,
    near_enough:   i32,
    /// `None` until the path has been searched.
    path:          Option<VecDeque<CPos>>,
    /// Ticks left before searching; drawn on first use.
    pathing_delay: Option<i32>,
    phase:         MovePhase,
    /// Ticks left to wait while blocked; `None` when not blocked.
    blocked_wait:  Option<i32>,
    cancelled:     bool,
}

impl MoveActivity {
    pub fn new(target: CPos, near_enough: i32) -> Self {
        Self {
            target,
            near_enough:   near_enough.max(0),
            path:          None,
            pathing_delay: None,
            phase:         MovePhase::AtCenter,
            blocked_wait:  None,
            cancelled:     false,
        }
    }

    /// A directive with a precomputed path and no pathing delay.
    pub(crate) fn with_path(target: CPos, path: Vec<CPos>) -> Self {
        Self {
            path: Some(path.into()),
            pathing_delay: Some(0),
            ..Self::new(target, 0)
        }
    }

    #[inline]
    pub fn target(&self) -> CPos {
        self.target
    }

    #[inline]
    pub fn near_enough(&self) -> i32 {
        self.near_enough
    }

    /// Cells still to enter, nearest first.  Empty before the search runs.
    pub fn remaining_path(&self) -> impl Iterator<Item = CPos> + '_ {
        self.path.iter().flatten().copied()
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// In the middle of a step.
    #[inline]
    pub fn is_between_cells(&self) -> bool {
        self.phase != MovePhase::AtCenter
    }

    pub(crate) fn cancel(&mut self) {
        self.cancelled = true;
        self.path = Some(VecDeque::new());
        self.blocked_wait = None;
    }
}

/// Whether the engine keeps the directive at the front of the queue.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ActivityState {
    Continue,
    Done,
}

enum StepOutcome {
    /// A step has begun; keep spending the budget.
    Stepped,
    /// Nothing more this tick.
    Wait,
    Done,
}

// ── Tick ──────────────────────────────────────────────────────────────────────

impl<P: PathFinder> MobileEngine<P> {
    /// Advance `act` (taken from the front of `m`'s queue) by one tick.
    pub(crate) fn tick_move(
        &mut self,
        actor: ActorId,
        m: &mut Mobile,
        act: &mut MoveActivity,
    ) -> MobileResult<ActivityState> {
        let mut budget = self.step_budget(m)?;

        for _ in 0..MAX_TRANSITIONS_PER_TICK {
            match act.phase {
                MovePhase::FirstHalf { mut half, origin } => {
                    m.center = half.advance(&mut budget);
                    if !half.is_done() {
                        act.phase = MovePhase::FirstHalf { half, origin };
                        return Ok(ActivityState::Continue);
                    }
                    // Midpoint: the actor now belongs to the next cell only.
                    let (to, sub) = (m.to_cell, m.to_sub);
                    self.set_location(actor, m, to, sub, to, sub);
                    let end = self.grid.center_of_sub_cell(to, sub);
                    act.phase = MovePhase::SecondHalf { half: HalfMove::new(m.center, end), origin };
                }
                MovePhase::SecondHalf { mut half, origin } => {
                    m.center = half.advance(&mut budget);
                    if !half.is_done() {
                        act.phase = MovePhase::SecondHalf { half, origin };
                        return Ok(ActivityState::Continue);
                    }
                    act.phase = MovePhase::AtCenter;
                    self.finished_moving(actor, m, origin)?;
                }
                MovePhase::AtCenter => {
                    if act.cancelled {
                        return Ok(ActivityState::Done);
                    }
                    match self.next_step(actor, m, act, budget)? {
                        StepOutcome::Stepped => {}
                        StepOutcome::Wait => return Ok(ActivityState::Continue),
                        StepOutcome::Done => return Ok(ActivityState::Done),
                    }
                }
            }
        }
        Ok(ActivityState::Continue)
    }

    /// World units the actor may cover this tick.  Impassable ground under
    /// the actor (after a teleport) counts as full speed.
    fn step_budget(&self, m: &Mobile) -> MobileResult<i32> {
        let percent = match self.locomotor(m)?.speed_for_cell(&self.grid, m.to_cell) {
            0 => 100,
            p => p as i32,
        };
        Ok(m.info.speed.saturating_mul(percent) / 100)
    }

    fn next_step(
        &mut self,
        actor: ActorId,
        m: &mut Mobile,
        act: &mut MoveActivity,
        budget: i32,
    ) -> MobileResult<StepOutcome> {
        if act.path.is_none() {
            let delay = match act.pathing_delay {
                Some(d) => d,
                None => self
                    .rng
                    .jitter(m.info.pathing_delay_average, m.info.pathing_delay_spread)
                    .max(0),
            };
            if delay > 0 {
                act.pathing_delay = Some(delay - 1);
                return Ok(StepOutcome::Wait);
            }
            act.pathing_delay = Some(0);
            if !self.plan_path(actor, m, act)? {
                return Ok(StepOutcome::Done);
            }
        }

        let Some(next) = act.path.as_ref().and_then(|p| p.front().copied()) else {
            return self.arrive(actor, m, act);
        };
        if budget <= 0 {
            return Ok(StepOutcome::Wait);
        }

        let here = m.to_cell;
        if next == here {
            if let Some(p) = act.path.as_mut() {
                p.pop_front();
            }
            return Ok(StepOutcome::Wait);
        }
        let same_xy = (next.x, next.y) == (here.x, here.y);
        if !here.is_adjacent_to(next) || (next.layer != here.layer && !same_xy) {
            debug!("{actor}: path step {here} -> {next} is not adjacent, searching again");
            act.path = None;
            return Ok(StepOutcome::Wait);
        }

        if !same_xy {
            let desired = WAngle::toward(next.x - here.x, next.y - here.y);
            if m.facing != desired {
                m.facing = m.facing.rotate_towards(desired, m.info.turn_speed);
                return Ok(StepOutcome::Wait);
            }
        }

        let (passable, sub) = {
            let loco = self.locomotor(m)?;
            let ctx = self.ctx();
            let passable = loco
                .movement_cost_to_enter_cell(&ctx, Some(actor), here, next, BlockingMode::None, None)
                .is_passable();
            let sub = loco.available_sub_cell(&ctx, Some(actor), next, m.from_sub, None, BlockingMode::All);
            (passable, sub)
        };
        if !passable {
            debug!("{actor}: {next} became impassable, searching again");
            act.path = None;
            return Ok(StepOutcome::Wait);
        }
        if sub == SubCell::Invalid {
            return self.blocked(actor, m, act, next);
        }

        // Start the step.
        act.blocked_wait = None;
        if let Some(p) = act.path.as_mut() {
            p.pop_front();
        }
        let (from, from_sub) = (m.to_cell, m.to_sub);
        self.set_location(actor, m, from, from_sub, next, sub);
        self.entering_cell(actor, m)?;
        let end = self.grid.center_of_sub_cell(next, sub);
        let mid = WPos::lerp(m.center, end, 1, 2);
        act.phase = MovePhase::FirstHalf { half: HalfMove::new(m.center, mid), origin: from };
        trace!("{actor}: step {from} -> {next} ({sub})");
        Ok(StepOutcome::Stepped)
    }

    /// Search the path.  `false` when there is none.
    fn plan_path(&self, actor: ActorId, m: &Mobile, act: &mut MoveActivity) -> MobileResult<bool> {
        let here = m.to_cell;
        let loco = self.locomotor(m)?;
        let ctx = self.ctx();

        if act.target != here && !loco.can_enter_cell(&ctx, Some(actor), act.target, BlockingMode::Immovable, None) {
            match self.nearest_moveable_cell_for(actor, m, act.target, 1, NEAREST_CELL_RANGE)? {
                Some(cell) => {
                    debug!("{actor}: {} cannot be entered, moving to {cell} instead", act.target);
                    act.target = cell;
                }
                None => {
                    debug!("{actor}: {} cannot be entered and nothing near it can", act.target);
                    return Ok(false);
                }
            }
        }

        let path = self
            .path_finder
            .find_path(&ctx, loco, actor, here, act.target, BlockingMode::Stationary);
        if path.is_empty() && here != act.target {
            debug!("{actor}: no path {here} -> {}", act.target);
            return Ok(false);
        }
        trace!("{actor}: path {here} -> {} ({} steps)", act.target, path.len());
        act.path = Some(path.into());
        Ok(true)
    }

    /// The path is exhausted.  Actors may not stop on cells they cannot stay
    /// in, so those continue to the nearest cell they can.
    fn arrive(&self, actor: ActorId, m: &Mobile, act: &mut MoveActivity) -> MobileResult<StepOutcome> {
        if act.cancelled || self.locomotor(m)?.can_stay_in_cell(&self.grid, m.to_cell) {
            return Ok(StepOutcome::Done);
        }
        match self.nearest_moveable_cell_for(actor, m, m.to_cell, 1, NEAREST_CELL_RANGE)? {
            Some(cell) => {
                debug!("{actor}: cannot stay in {}, continuing to {cell}", m.to_cell);
                act.target = cell;
                act.near_enough = 0;
                act.path = None;
                act.pathing_delay = Some(0);
                Ok(StepOutcome::Wait)
            }
            None => Ok(StepOutcome::Done),
        }
    }

    fn blocked(
        &mut self,
        actor: ActorId,
        m: &mut Mobile,
        act: &mut MoveActivity,
        next: CPos,
    ) -> MobileResult<StepOutcome> {
        let near = act.near_enough;
        if (m.to_cell - act.target).length_squared() <= near * near {
            debug!("{actor}: blocked at {}, close enough to {}", m.to_cell, act.target);
            return Ok(StepOutcome::Done);
        }
        m.is_blocking = true;

        match act.blocked_wait {
            None => {
                let blockers: Vec<ActorId> = {
                    let loco = self.locomotor(m)?;
                    let ctx = self.ctx();
                    self.actor_map
                        .actors_at(next)
                        .filter(|&o| loco.is_blocked_by(&ctx, Some(actor), o, BlockingMode::All, None))
                        .collect()
                };
                for blocker in blockers {
                    if self.yields_to(blocker, actor) {
                        self.request_nudge(blocker, actor, NudgeCause::Blocking);
                    }
                }
                let (average, spread) = {
                    let info = self.locomotor(m)?.info();
                    (info.wait_average, info.wait_spread)
                };
                act.blocked_wait = Some(self.rng.jitter(average, spread).max(1));
                trace!("{actor}: blocked entering {next}");
                Ok(StepOutcome::Wait)
            }
            Some(w) if w > 1 => {
                act.blocked_wait = Some(w - 1);
                Ok(StepOutcome::Wait)
            }
            Some(_) => {
                act.blocked_wait = None;
                let (path, give_up) = {
                    let loco = self.locomotor(m)?;
                    let ctx = self.ctx();
                    let path = self
                        .path_finder
                        .find_path(&ctx, loco, actor, m.to_cell, act.target, BlockingMode::All);
                    let give_up = path.is_empty()
                        && (!loco.can_enter_cell(&ctx, Some(actor), next, BlockingMode::Immovable, None)
                            || self.actor_map.actors_at(next).any(|o| {
                                loco.is_blocked_by(&ctx, Some(actor), o, BlockingMode::All, None)
                                    && !self.yields_to(o, actor)
                            }));
                    (path, give_up)
                };
                if !path.is_empty() {
                    debug!("{actor}: searched around the block at {next}");
                    act.path = Some(path.into());
                } else if give_up {
                    debug!("{actor}: {next} stays blocked, giving up on {}", act.target);
                    return Ok(StepOutcome::Done);
                }
                Ok(StepOutcome::Wait)
            }
        }
    }
}
