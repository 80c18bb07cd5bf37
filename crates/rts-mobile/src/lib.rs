//! `rts-mobile`: the per-actor movement state machine.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                           |
//! |--------------|--------------------------------------------------------------------|
//! | [`state`]    | `Mobile` state, `MobileInfo`, `MobileStatus`, `MobileInit`         |
//! | [`store`]    | `MobileStore` (also the locomotor's `MotionView`), static occupants|
//! | [`engine`]   | `MobileEngine<P>`: lifecycle, `SetLocation`, teleports, tick      |
//! | [`activity`] | `MoveActivity`: path-following move directive                     |
//! | `nudge`      | nudge requests and their resolution                                |
//! | `crush`      | crush warnings on step start, crushes on step end                  |
//! | [`events`]   | `MovementEvent`, `MovementObserver`, `ObserverRegistry`            |
//! | [`error`]    | `MobileError`, `MobileResult<T>`                                   |
//!
//! # Movement model
//!
//! Actors move cell by cell along a path from the engine's
//! [`PathFinder`][rts_locomotion::PathFinder].  Each step is two half-moves
//! in world units; the actor occupies both cells for the first half and only
//! the new one from the midpoint on.  Occupancy is written only through
//! `SetLocation`, so the [`ActorMap`][rts_spatial::ActorMap] always holds
//! exactly what every actor's `occupied_cells()` projection says.
//!
//! All randomness (pathing delays, blocked waits, crush warnings, nudge
//! targets) comes from the engine's one `SimRng`, consumed in ascending
//! `ActorId` order.

pub mod activity;
mod crush;
pub mod engine;
pub mod error;
pub mod events;
mod nudge;
pub mod state;
pub mod store;

#[cfg(test)]
mod tests;

pub use activity::{MoveActivity, NEAREST_CELL_RANGE};
pub use engine::MobileEngine;
pub use error::{MobileError, MobileResult};
pub use events::{EventKind, MovementEvent, MovementObserver, ObserverHandle, ObserverRegistry};
pub use state::{DEFAULT_SPEED, DEFAULT_TURN_SPEED, Mobile, MobileInfo, MobileInit, MobileStatus};
pub use store::{MobileStore, StaticOccupant};
