//! `rts-core`: foundational types for the lockstep RTS movement core.
//!
//! This crate is a dependency of every other `rts-*` crate.  It has no
//! `rts-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `ActorId`, `PlayerId`, `LocomotorId`, `TerrainIndex`       |
//! | [`coords`]      | `CPos`, `CVec`, `WPos`, `WVec`, `WAngle`, `SubCell`        |
//! | [`movement`]    | `MovementType` flag set                                    |
//! | [`classes`]     | `ClassSet` bit-sets, `ClassRegistry` name interning        |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                            |
//! | [`rng`]         | `SimRng` (the shared lockstep random source)               |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod classes;
pub mod coords;
pub mod error;
pub mod ids;
pub mod movement;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use classes::{ClassRegistry, ClassSet, CrushClass, CrushClasses, DamageType, DamageTypes};
pub use coords::{CELL_SIZE, CPos, CVec, SubCell, WAngle, WPos, WVec};
pub use error::{CoreError, CoreResult};
pub use ids::{ActorId, LocomotorId, PlayerId, TerrainIndex};
pub use movement::MovementType;
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
