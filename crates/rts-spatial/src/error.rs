//! Spatial-subsystem error type.

use thiserror::Error;

use rts_core::{ActorId, CPos};

/// Errors produced by `rts-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("map dimensions {width}x{height} are invalid")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("a map needs between 1 and 254 terrain types, got {0}")]
    TerrainTypeCount(usize),

    #[error("unknown terrain {0:?}")]
    UnknownTerrain(String),

    #[error("row {row} does not have {expected} cells")]
    RaggedRow { row: usize, expected: usize },

    #[error("cell {0} is outside the map")]
    OutOfBounds(CPos),

    #[error("layer index 0 is reserved for the ground")]
    LayerIndexReserved,

    #[error("layer {0} is already registered")]
    DuplicateLayer(u8),

    #[error("occupancy index out of sync for {actor}: {detail}")]
    Inconsistent { actor: ActorId, detail: String },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
