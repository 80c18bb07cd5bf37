//! `rts-locomotion`: movement cost and blocking policy.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                          |
//! |-----------------|-------------------------------------------------------------------|
//! | [`terrain`]     | `MovementCost` sentinel, `TerrainInfo`, `TerrainCostTable`        |
//! | [`locomotor`]   | `LocomotorInfo`, `Locomotor`, `LocomotorSet`, `BlockingMode`, `MotionView`, `MoveContext` |
//! | [`loader`]      | CSV loading of `LocomotorInfo`s                                   |
//! | [`path`]        | `PathFinder` trait, `DijkstraPathFinder`                          |
//! | [`error`]       | `LocomotionError`, `LocomotionResult<T>`                          |
//!
//! A `Locomotor` holds no per-actor state; every query is a pure function
//! of its arguments and the world snapshot passed in a `MoveContext`.

pub mod error;
pub mod loader;
pub mod locomotor;
pub mod path;
pub mod terrain;


pub use error::{LocomotionError, LocomotionResult};
pub use loader::{load_locomotors_csv, load_locomotors_reader};
pub use locomotor::{
    BlockingMode, DEFAULT_WAIT_AVERAGE, DEFAULT_WAIT_SPREAD, Locomotor, LocomotorInfo, LocomotorSet, Motion,
    MotionView, MoveContext, NoMotion, TerrainSpeed,
};
pub use path::{DijkstraPathFinder, PathFinder};
pub use terrain::{COST_SCALE, MovementCost, TerrainCostTable, TerrainInfo};
