//! The order boundary: directives handed to the world by players or AI.
//!
//! Orders are queued with [`World::submit`][crate::World::submit] and
//! applied in submission order at the start of the next tick, before any
//! mobile moves.  They are not validated beyond what the movement core
//! itself rejects: an order for an actor that cannot take it, or for a
//! cell off the map, is dropped and the remaining orders still apply.
//!
//! | Order      | Movement call                          |
//! |------------|----------------------------------------|
//! | `Move`     | `MobileEngine::move_to`                |
//! | `Teleport` | `MobileEngine::set_position`           |
//! | `Stop`     | `MobileEngine::cancel`                 |
//! | `Scatter`  | `MobileEngine::scatter`                |

use rts_core::{ActorId, CPos, SubCell};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Order {
    /// Walk to `target`.  Unless `queued`, replaces the current directive.
    Move {
        actor:       ActorId,
        target:      CPos,
        near_enough: i32,
        queued:      bool,
    },
    /// Jump straight to `cell`, ignoring occupancy.
    Teleport {
        actor: ActorId,
        cell:  CPos,
        sub:   SubCell,
    },
    Stop { actor: ActorId },
    /// Step one cell aside if idle.
    Scatter { actor: ActorId },
}

impl Order {
    pub fn actor(&self) -> ActorId {
        match *self {
            Order::Move { actor, .. }
            | Order::Teleport { actor, .. }
            | Order::Stop { actor }
            | Order::Scatter { actor } => actor,
        }
    }

    /// Shorthand for an unqueued move that must reach `target` exactly.
    pub fn move_to(actor: ActorId, target: CPos) -> Self {
        Order::Move { actor, target, near_enough: 0, queued: false }
    }
}
