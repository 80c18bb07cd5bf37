//! `rts-sim`: tick loop orchestrator for the RTS movement core.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Orders     apply every submitted Order in submission order
//!                 (Move, Teleport, Stop, Scatter).
//!   ② Movement   MobileEngine::tick: each live mobile in ascending ActorId
//!                 order, then nudge resolution, then position-index refresh.
//!   ③ Check      optional ActorMap verification.
//!   ④ Observe    on_tick_end with the tick's movement events; on_snapshot
//!                 every snapshot_interval_ticks.
//! ```
//!
//! Every random draw comes from one `SimRng` seeded with `config.seed`, so
//! two worlds built from the same inputs and fed the same orders produce the
//! same events tick for tick.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use rts_sim::{NoopObserver, Order, WorldBuilder};
//!
//! let mut world = WorldBuilder::new(config, grid, locomotors, actors)
//!     .mobile(tank, MobileInfo::new(tracked), MobileInit::Cell(CPos::new(1, 1), SubCell::Any))
//!     .build()?;
//! world.submit(Order::move_to(tank, CPos::new(6, 4)));
//! world.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod order;
pub mod world;


pub use builder::{Placement, WorldBuilder};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use order::Order;
pub use world::World;
