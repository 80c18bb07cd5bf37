//! Fluent builder for constructing an `ActorStore`.
//!
//! # Usage
//!
//! ```rust
//! use rts_actor::{ActorStoreBuilder, Crushable, PlayerTable};
//! use rts_core::CrushClasses;
//!
//! let mut players = PlayerTable::new();
//! let red = players.add("red", Some(0));
//!
//! let mut b = ActorStoreBuilder::new(players);
//! let tank = b.actor("tank", red).unwrap();
//! let rifle = b
//!     .crushable_actor("rifle", red, Crushable::new(CrushClasses::from_bits(1)))
//!     .unwrap();
//! let store = b.build();
//!
//! assert_eq!(store.count, 2);
//! assert!(store.crushable(tank).is_none());
//! assert!(store.crushable(rifle).is_some());
//! ```

use rts_core::{ActorId, PlayerId};

use crate::{ActorError, ActorResult, ActorStore, Crushable, PlayerTable};

/// Fluent builder for [`ActorStore`].
///
/// Actors receive sequential ids in insertion order; that order is the
/// per-tick iteration order of the simulation.
pub struct ActorStoreBuilder {
    store: ActorStore,
}

impl ActorStoreBuilder {
    pub fn new(players: PlayerTable) -> Self {
        Self { store: ActorStore::new(players) }
    }

    /// Add a non-crushable actor owned by `owner`.
    pub fn actor(&mut self, kind: &str, owner: PlayerId) -> ActorResult<ActorId> {
        self.push(kind, owner, None)
    }

    pub fn crushable_actor(&mut self, kind: &str, owner: PlayerId, crushable: Crushable) -> ActorResult<ActorId> {
        self.push(kind, owner, Some(crushable))
    }

    fn push(&mut self, kind: &str, owner: PlayerId, crushable: Option<Crushable>) -> ActorResult<ActorId> {
        if !self.store.players.contains(owner) {
            return Err(ActorError::UnknownPlayer(owner));
        }
        Ok(self.store.push(kind, owner, crushable))
    }

    pub fn len(&self) -> usize {
        self.store.count
    }

    pub fn is_empty(&self) -> bool {
        self.store.count == 0
    }

    pub fn build(self) -> ActorStore {
        self.store
    }
}
