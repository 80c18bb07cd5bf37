//! Core actor storage: `ActorStore` (SoA data) plus the crushable and
//! death records the crush resolver reads and writes.

use rts_core::{ActorId, CrushClasses, DamageTypes, PlayerId, Tick};

use crate::{ActorError, ActorResult, PlayerTable};

/// Percent chance a crushable actor tries to dodge a warned crush.
pub const DEFAULT_WARN_PROBABILITY: u8 = 75;

// ── Crushable ─────────────────────────────────────────────────────────────────

/// Marks an actor as crushable by movers whose locomotor carries any of
/// `classes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crushable {
    pub classes:               CrushClasses,
    /// Percent chance (0–100) the actor tries to flee when warned.
    pub warn_probability:      u8,
    pub crushed_by_friendlies: bool,
}

impl Crushable {
    pub fn new(classes: CrushClasses) -> Self {
        Self {
            classes,
            warn_probability:      DEFAULT_WARN_PROBABILITY,
            crushed_by_friendlies: false,
        }
    }

    pub fn warn_probability(mut self, percent: u8) -> Self {
        self.warn_probability = percent.min(100);
        self
    }

    pub fn crushed_by_friendlies(mut self, on: bool) -> Self {
        self.crushed_by_friendlies = on;
        self
    }
}

/// How an actor died.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Death {
    pub killer:       ActorId,
    pub damage_types: DamageTypes,
    pub tick:         Tick,
}

// ── ActorStore ────────────────────────────────────────────────────────────────

/// Structure-of-Arrays storage for all actors.
///
/// Every `Vec` field has exactly `count` elements; the `ActorId` value is the
/// index into all of them.  Dead actors keep their slot.
///
/// Construct via [`ActorStoreBuilder`][crate::ActorStoreBuilder].
pub struct ActorStore {
    /// Number of actors.  Equals the length of every SoA `Vec`.
    pub count: usize,

    /// Actor type name, for logging and observers.
    pub kind: Vec<String>,

    pub owner: Vec<PlayerId>,

    pub alive: Vec<bool>,

    /// `Some` for actors that can be crushed.
    pub crushable: Vec<Option<Crushable>>,

    /// Set once, when the actor is killed.
    pub death: Vec<Option<Death>>,

    pub players: PlayerTable,
}

impl ActorStore {
    pub(crate) fn new(players: PlayerTable) -> Self {
        Self {
            count:     0,
            kind:      Vec::new(),
            owner:     Vec::new(),
            alive:     Vec::new(),
            crushable: Vec::new(),
            death:     Vec::new(),
            players,
        }
    }

    pub(crate) fn push(&mut self, kind: &str, owner: PlayerId, crushable: Option<Crushable>) -> ActorId {
        let id = ActorId(self.count as u32);
        self.kind.push(kind.to_owned());
        self.owner.push(owner);
        self.alive.push(true);
        self.crushable.push(crushable);
        self.death.push(None);
        self.count += 1;
        id
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn contains(&self, actor: ActorId) -> bool {
        actor.index() < self.count
    }

    /// Iterator over all `ActorId`s in ascending index order.
    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        (0..self.count as u32).map(ActorId)
    }

    pub fn check(&self, actor: ActorId) -> ActorResult<()> {
        if self.contains(actor) { Ok(()) } else { Err(ActorError::UnknownActor(actor)) }
    }

    #[inline]
    pub fn is_alive(&self, actor: ActorId) -> bool {
        self.alive.get(actor.index()).copied().unwrap_or(false)
    }

    #[inline]
    pub fn owner(&self, actor: ActorId) -> PlayerId {
        self.owner.get(actor.index()).copied().unwrap_or(PlayerId::INVALID)
    }

    #[inline]
    pub fn crushable(&self, actor: ActorId) -> Option<&Crushable> {
        self.crushable.get(actor.index()).and_then(Option::as_ref)
    }

    /// `true` if a mover owned by `crusher_owner` whose locomotor carries
    /// `crush_classes` may crush `victim`.
    ///
    /// Requires a live, crushable victim, intersecting classes, and either a
    /// non-allied crusher or a victim that can be crushed by friendlies.
    pub fn crushable_by(&self, victim: ActorId, crusher_owner: PlayerId, crush_classes: CrushClasses) -> bool {
        if !self.is_alive(victim) {
            return false;
        }
        let Some(c) = self.crushable(victim) else {
            return false;
        };
        if !c.crushed_by_friendlies && self.players.are_allies(crusher_owner, self.owner(victim)) {
            return false;
        }
        c.classes.intersects(crush_classes)
    }

    /// Mark `victim` dead.  Returns `false` if it was already dead.
    pub fn kill(&mut self, victim: ActorId, killer: ActorId, damage_types: DamageTypes, tick: Tick) -> ActorResult<bool> {
        self.check(victim)?;
        let i = victim.index();
        if !self.alive[i] {
            return Ok(false);
        }
        self.alive[i] = false;
        self.death[i] = Some(Death { killer, damage_types, tick });
        Ok(true)
    }

    pub fn death(&self, actor: ActorId) -> Option<&Death> {
        self.death.get(actor.index()).and_then(Option::as_ref)
    }
}
