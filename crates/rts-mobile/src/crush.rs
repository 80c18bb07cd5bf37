//! Crush resolution.
//!
//! A mover whose locomotor carries crush classes warns every crushable
//! occupant of a cell when it starts stepping into it, and crushes the ones
//! still there (and still crushable) when the step finishes.  Both halves
//! apply only at ground level: on the ground or on a layer that interacts
//! with it.
//!
//! | Moment          | Check                          | Outcome                                   |
//! |-----------------|--------------------------------|-------------------------------------------|
//! | step starts     | `Locomotor::can_crush`         | warn roll; idle mobile winners flee       |
//! | step finishes   | `Locomotor::can_crush` again   | kill, removal from the world, `Crushed`   |

use log::debug;

use rts_core::{ActorId, CPos, DamageTypes};
use rts_locomotion::PathFinder;

use crate::nudge::NudgeCause;
use crate::{Mobile, MobileEngine, MobileResult, MobileStatus, MovementEvent};

impl<P: PathFinder> MobileEngine<P> {
    /// Occupants of `m.to_cell` that `actor` may crush, ascending.
    fn crush_candidates(&self, actor: ActorId, m: &Mobile) -> MobileResult<Vec<ActorId>> {
        if !self.grid.is_at_ground_level(m.to_cell) {
            return Ok(Vec::new());
        }
        let loco = self.locomotor(m)?;
        Ok(self
            .actor_map
            .actors_at(m.to_cell)
            .filter(|&o| o != actor && loco.can_crush(&self.actors, actor, o))
            .collect())
    }

    /// A step into `m.to_cell` has begun.
    pub(crate) fn entering_cell(&mut self, actor: ActorId, m: &Mobile) -> MobileResult<()> {
        for victim in self.crush_candidates(actor, m)? {
            self.warn_crush(victim, actor);
        }
        Ok(())
    }

    fn warn_crush(&mut self, victim: ActorId, crusher: ActorId) {
        let Some(probability) = self.actors.crushable(victim).map(|c| c.warn_probability) else {
            return;
        };
        let roll = self.rng.percent(probability);
        let fleeing = roll
            && self
                .store
                .get(victim)
                .is_some_and(|v| v.in_world && v.is_idle() && v.status == MobileStatus::Enabled);
        if fleeing {
            self.request_nudge(victim, crusher, NudgeCause::CrushWarning);
        }
        self.emit(MovementEvent::CrushWarned { victim, crusher, fleeing });
    }

    /// A step (or teleport) that started in `origin` has come to rest in
    /// `m.to_cell`.
    ///
    /// Steps that changed layer are still in transit as far as observers are
    /// concerned and raise no `FinishedMoving`.
    pub(crate) fn finished_moving(&mut self, actor: ActorId, m: &Mobile, origin: CPos) -> MobileResult<()> {
        if origin.layer == m.to_cell.layer {
            self.emit(MovementEvent::FinishedMoving { actor, cell: m.to_cell });
        }
        let damage_types = self.locomotor(m)?.info().crush_damage_types;
        for victim in self.crush_candidates(actor, m)? {
            self.crush(victim, actor, damage_types)?;
        }
        Ok(())
    }

    fn crush(&mut self, victim: ActorId, crusher: ActorId, damage_types: DamageTypes) -> MobileResult<()> {
        if !self.actors.kill(victim, crusher, damage_types, self.now)? {
            return Ok(());
        }
        self.actor_map.remove_influence(victim);
        self.actor_map.remove_position(victim);
        if let Some(v) = self.store.get_mut(victim) {
            v.in_world = false;
            v.is_blocking = false;
            v.activities.clear();
        }
        self.statics.remove(&victim);
        self.nudges.remove(&victim);
        debug!("{victim} crushed by {crusher} at {}", self.now);
        self.emit(MovementEvent::Crushed { victim, crusher, damage_types });
        Ok(())
    }
}
