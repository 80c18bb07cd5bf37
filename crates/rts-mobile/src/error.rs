//! Mobile-subsystem error type.

use thiserror::Error;

use rts_actor::ActorError;
use rts_core::{ActorId, CPos, LocomotorId};
use rts_spatial::SpatialError;

/// API misuse and consistency failures.  Gameplay outcomes (blocked,
/// impassable, no nudge target) are never errors.
#[derive(Debug, Error)]
pub enum MobileError {
    #[error("{0} has no mobile")]
    NoMobile(ActorId),

    #[error("{0} already has a mobile")]
    AlreadyMobile(ActorId),

    #[error("{0} is dead")]
    Dead(ActorId),

    #[error("unknown locomotor {0}")]
    UnknownLocomotor(LocomotorId),

    #[error("cell {cell} for {actor} is not on the grid")]
    OffGrid { actor: ActorId, cell: CPos },

    #[error(transparent)]
    Actor(#[from] ActorError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

pub type MobileResult<T> = Result<T, MobileError>;
