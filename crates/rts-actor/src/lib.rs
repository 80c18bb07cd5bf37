//! `rts-actor`: Structure-of-Arrays actor storage.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                      |
//! |-----------------|---------------------------------------------------------------|
//! | [`players`]     | `PlayerTable`, `Player`, `Relationship`                       |
//! | [`store`]       | `ActorStore` (SoA arrays), `Crushable`, `Death`               |
//! | [`builder`]     | `ActorStoreBuilder` (fluent construction)                     |
//! | [`error`]       | `ActorError`, `ActorResult<T>`                                |
//!
//! The store knows nothing about movement.  Mobility lives in `rts-mobile`,
//! keyed by the same `ActorId`s.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `serde`    | Derives `Serialize`/`Deserialize` on all public types.     |

pub mod builder;
pub mod error;
pub mod players;
pub mod store;


pub use builder::ActorStoreBuilder;
pub use error::{ActorError, ActorResult};
pub use players::{Player, PlayerTable, Relationship};
pub use store::{ActorStore, Crushable, Death};
