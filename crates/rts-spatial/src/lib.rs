//! `rts-spatial`: terrain, movement layers, and occupancy.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                        |
//! |-----------------|-----------------------------------------------------------------|
//! | [`map`]         | `TerrainMap` (dense terrain + heights), `MapBuilder`            |
//! | [`layers`]      | `CustomMovementLayer` trait, `GridLayer`, `LayerRegistry`       |
//! | [`grid`]        | `Grid`: one cell API over the map and every layer              |
//! | [`actor_map`]   | `ActorMap` occupancy index, `OccupySpace` trait                 |
//! | [`error`]       | `SpatialError`, `SpatialResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on core types.             |

pub mod actor_map;
pub mod error;
pub mod grid;
pub mod layers;
pub mod map;

#[cfg(test)]
mod tests;

pub use actor_map::{ActorMap, InfluenceEntry, OccupiedCells, OccupySpace};
pub use error::{SpatialError, SpatialResult};
pub use grid::Grid;
pub use layers::{CustomMovementLayer, GridLayer, LayerRegistry};
pub use map::{MapBuilder, TerrainMap};
