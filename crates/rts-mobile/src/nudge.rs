//! Nudging: best-effort single-step displacement of idle actors.
//!
//! Requests raised during a tick (by blocked movers and by warned crush
//! victims) are queued per target and the first request for a target wins.
//! They are resolved after every mobile has ticked, in ascending target
//! order, so the resulting moves start on the next tick.
//!
//! A blocked mover only pushes allies aside; enemies stay put.  Crush
//! warnings and scatter orders are forced: they ignore allegiance and make a
//! busy actor drop what it is doing.
//!
//! A nudged actor prefers a neighbouring cell it can enter and stay in.
//! Failing that it picks a neighbour held only by actors that can be nudged
//! in turn, and its own blocked handling passes the request on.  With no
//! candidate at all the nudge does nothing.

use log::debug;
use smallvec::{SmallVec, smallvec};

use rts_core::{ActorId, CPos, CVec};
use rts_locomotion::{BlockingMode, PathFinder};

use crate::{MobileEngine, MobileError, MobileResult, MoveActivity};

/// Why a nudge was requested.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum NudgeCause {
    /// The nudger is blocked by the target.
    Blocking,
    /// The target was warned that the nudger is about to crush it.
    CrushWarning,
}

impl<P: PathFinder> MobileEngine<P> {
    pub(crate) fn request_nudge(&mut self, target: ActorId, nudger: ActorId, cause: NudgeCause) {
        self.nudges.entry(target).or_insert((nudger, cause));
    }

    pub(crate) fn resolve_nudges(&mut self) -> MobileResult<()> {
        let requests = std::mem::take(&mut self.nudges);
        for (target, (nudger, cause)) in requests {
            if self.store.contains(target) {
                self.push_aside(target, Some(nudger), cause == NudgeCause::CrushWarning)?;
            }
        }
        Ok(())
    }

    /// `true` if `actor` would step aside for `nudger`: a nudgeable mobile
    /// owned by an ally.
    pub(crate) fn yields_to(&self, actor: ActorId, nudger: ActorId) -> bool {
        self.store.get(actor).is_some_and(|m| m.is_nudgeable())
            && self
                .actors
                .players
                .are_allies(self.actors.owner(actor), self.actors.owner(nudger))
    }

    /// Push `actor` one cell aside, away from `nudger` if given.
    ///
    /// Returns `true` if a move was queued.  Only idle, nudgeable actors in
    /// the world move, and only for an allied nudger.
    pub fn nudge(&mut self, actor: ActorId, nudger: Option<ActorId>) -> MobileResult<bool> {
        self.push_aside(actor, nudger, false)
    }

    /// Forced nudge: `actor` drops its current orders and steps to a
    /// neighbouring cell.  A step already under way finishes first.
    pub fn scatter(&mut self, actor: ActorId) -> MobileResult<bool> {
        self.push_aside(actor, None, true)
    }

    fn push_aside(&mut self, actor: ActorId, nudger: Option<ActorId>, force: bool) -> MobileResult<bool> {
        self.actors.check(actor)?;
        if let Some(n) = nudger {
            self.actors.check(n)?;
        }
        let (free, fallback) = {
            let m = self.store.get(actor).ok_or(MobileError::NoMobile(actor))?;
            if !self.actors.is_alive(actor) || !m.in_world || !m.is_nudgeable() {
                return Ok(false);
            }
            if !force {
                if !m.is_idle() {
                    return Ok(false);
                }
                if let Some(n) = nudger {
                    if !self.actors.players.are_allies(self.actors.owner(actor), self.actors.owner(n)) {
                        debug!("{actor}: refuses a nudge from {n}");
                        return Ok(false);
                    }
                }
            }
            let avoid = self.cells_of(nudger);
            let loco = self.locomotor(m)?;
            let ctx = self.ctx();

            let mut free: Vec<CPos> = Vec::new();
            let mut fallback: Vec<CPos> = Vec::new();
            for d in CVec::DIRECTIONS {
                let cell = m.to_cell + d;
                if avoid.contains(&cell) || !loco.can_stay_in_cell(&self.grid, cell) {
                    continue;
                }
                if loco.can_enter_cell(&ctx, Some(actor), cell, BlockingMode::All, None) {
                    free.push(cell);
                } else if loco.can_enter_cell(&ctx, Some(actor), cell, BlockingMode::Immovable, None) {
                    fallback.push(cell);
                }
            }
            (free, fallback)
        };

        let pool = if free.is_empty() { &fallback } else { &free };
        let Some(&cell) = self.rng.choose(pool) else {
            debug!("{actor}: nothing to be nudged into");
            return Ok(false);
        };
        if let Some(m) = self.store.get_mut(actor) {
            if force {
                m.cancel_activities();
            }
            m.activities.push_back(MoveActivity::with_path(cell, vec![cell]));
        }
        debug!("{actor}: nudged toward {cell}");
        Ok(true)
    }

    /// Cells held by `actor` (both while it is between cells).
    fn cells_of(&self, actor: Option<ActorId>) -> SmallVec<[CPos; 2]> {
        let Some(actor) = actor else {
            return SmallVec::new();
        };
        if let Some(m) = self.store.get(actor) {
            smallvec![m.from_cell, m.to_cell]
        } else if let Some(s) = self.statics.get(&actor) {
            smallvec![s.cell]
        } else {
            SmallVec::new()
        }
    }
}
