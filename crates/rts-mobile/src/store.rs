//! `MobileStore`: per-actor mobile state, plus static occupants.

use std::collections::BTreeMap;

use smallvec::smallvec;

use rts_core::{ActorId, CPos, SubCell, WPos};
use rts_locomotion::{Motion, MotionView};
use rts_spatial::{OccupiedCells, OccupySpace};

use crate::Mobile;

/// Mobiles indexed by `ActorId`.  Actors without a mobile have a `None`
/// slot.
///
/// While the engine ticks an actor its mobile is taken out of the store and
/// put back afterwards; queries in between see that slot as empty.
#[derive(Default)]
pub struct MobileStore {
    mobiles: Vec<Option<Mobile>>,
}

impl MobileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, actor: ActorId, mobile: Mobile) {
        let i = actor.index();
        if self.mobiles.len() <= i {
            self.mobiles.resize_with(i + 1, || None);
        }
        self.mobiles[i] = Some(mobile);
    }

    #[inline]
    pub fn get(&self, actor: ActorId) -> Option<&Mobile> {
        self.mobiles.get(actor.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, actor: ActorId) -> Option<&mut Mobile> {
        self.mobiles.get_mut(actor.index()).and_then(Option::as_mut)
    }

    #[inline]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.get(actor).is_some()
    }

    pub(crate) fn take(&mut self, actor: ActorId) -> Option<Mobile> {
        self.mobiles.get_mut(actor.index()).and_then(Option::take)
    }

    pub(crate) fn put(&mut self, actor: ActorId, mobile: Mobile) {
        self.insert(actor, mobile);
    }

    /// Actors with a mobile, ascending.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.mobiles
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_some())
            .map(|(i, _)| ActorId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorId, &Mobile)> {
        self.mobiles
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (ActorId(i as u32), m)))
    }

    pub fn len(&self) -> usize {
        self.mobiles.iter().filter(|m| m.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MotionView for MobileStore {
    fn motion(&self, actor: ActorId) -> Option<Motion> {
        self.get(actor).map(|m| Motion {
            is_moving: m.is_moving(),
            nudgeable: m.is_nudgeable(),
        })
    }
}

// ── Static occupants ──────────────────────────────────────────────────────────

/// An actor that occupies one cell and never moves (walls, buildings).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticOccupant {
    pub cell:   CPos,
    pub sub:    SubCell,
    pub center: WPos,
}

impl OccupySpace for StaticOccupant {
    fn occupied_cells(&self) -> OccupiedCells {
        smallvec![(self.cell, self.sub)]
    }

    fn center_position(&self) -> WPos {
        self.center
    }
}

pub type StaticOccupants = BTreeMap<ActorId, StaticOccupant>;
