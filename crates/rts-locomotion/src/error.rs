//! Locomotion-subsystem error type.

use thiserror::Error;

use rts_core::CoreError;

/// Errors produced by `rts-locomotion`.  Only loading and configuration can
/// fail; movement queries answer with costs and sentinels instead.
#[derive(Debug, Error)]
pub enum LocomotionError {
    #[error("locomotor {locomotor:?} names unknown terrain {terrain:?}")]
    UnknownTerrain { locomotor: String, terrain: String },

    #[error("terrain speeds reference unknown locomotor {0:?}")]
    UnknownLocomotor(String),

    #[error("locomotor {0:?} is defined twice")]
    DuplicateLocomotor(String),

    #[error("too many locomotors")]
    TooManyLocomotors,

    #[error("locomotor CSV parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LocomotionResult<T> = Result<T, LocomotionError>;
