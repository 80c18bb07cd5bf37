//! Fluent builder for constructing a [`World`].

use rts_actor::ActorStore;
use rts_core::{ActorId, CPos, SimConfig, SimRng, SubCell};
use rts_locomotion::{DijkstraPathFinder, LocomotorSet, PathFinder};
use rts_mobile::{MobileEngine, MobileInfo, MobileInit};
use rts_spatial::Grid;

use crate::{SimError, SimResult, World};

/// Where and how one actor enters the world.
#[derive(Clone, Debug)]
pub enum Placement {
    Mobile(MobileInfo, MobileInit),
    /// Occupies one cell and never moves.
    Static(CPos, SubCell),
}

/// Fluent builder for [`World<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total ticks, seed, tick duration, …
/// - [`Grid`]: terrain map plus custom movement layers
/// - [`LocomotorSet`]: every locomotor mobiles may reference
/// - [`ActorStore`]: from [`rts_actor::ActorStoreBuilder`]
///
/// # Optional inputs (have defaults)
///
/// | Method                  | Default                |
/// |-------------------------|------------------------|
/// | `.placements(v)`        | No actor placed        |
/// | `.mobile(..)`           | No actor placed        |
/// | `.static_actor(..)`     | No actor placed        |
/// | `.path_finder(p)`       | [`DijkstraPathFinder`] |
/// | `.verify_each_tick(b)`  | `false`                |
///
/// # Example
///
/// ```rust,ignore
/// let mut world = WorldBuilder::new(config, grid, locomotors, actors)
///     .mobile(tank, MobileInfo::new(tracked), MobileInit::Cell(CPos::new(2, 2), SubCell::Any))
///     .static_actor(wall, CPos::new(5, 5), SubCell::FullCell)
///     .build()?;
/// world.submit(Order::move_to(tank, CPos::new(8, 8)));
/// world.run(&mut NoopObserver)?;
/// ```
pub struct WorldBuilder<P: PathFinder = DijkstraPathFinder> {
    config:           SimConfig,
    grid:             Grid,
    locomotors:       LocomotorSet,
    actors:           ActorStore,
    placements:       Vec<(ActorId, Placement)>,
    bulk:             Option<Vec<Option<Placement>>>,
    path_finder:      P,
    verify_each_tick: bool,
}

impl WorldBuilder<DijkstraPathFinder> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, grid: Grid, locomotors: LocomotorSet, actors: ActorStore) -> Self {
        Self {
            config,
            grid,
            locomotors,
            actors,
            placements: Vec::new(),
            bulk: None,
            path_finder: DijkstraPathFinder::default(),
            verify_each_tick: false,
        }
    }
}

impl<P: PathFinder> WorldBuilder<P> {
    /// Use a different path search for move directives.
    pub fn path_finder<Q: PathFinder>(self, path_finder: Q) -> WorldBuilder<Q> {
        WorldBuilder {
            config: self.config,
            grid: self.grid,
            locomotors: self.locomotors,
            actors: self.actors,
            placements: self.placements,
            bulk: self.bulk,
            path_finder,
            verify_each_tick: self.verify_each_tick,
        }
    }

    /// Place `actor` as a mobile.
    pub fn mobile(mut self, actor: ActorId, info: MobileInfo, init: MobileInit) -> Self {
        self.placements.push((actor, Placement::Mobile(info, init)));
        self
    }

    pub fn static_actor(mut self, actor: ActorId, cell: CPos, sub: SubCell) -> Self {
        self.placements.push((actor, Placement::Static(cell, sub)));
        self
    }

    /// Supply one optional placement per actor, indexed by `ActorId`.
    ///
    /// Must be length `actor_count`.  Applied before placements added with
    /// [`mobile`](Self::mobile) and [`static_actor`](Self::static_actor).
    pub fn placements(mut self, placements: Vec<Option<Placement>>) -> Self {
        self.bulk = Some(placements);
        self
    }

    /// Check the occupancy index after every tick and fail the run on the
    /// first mismatch.
    pub fn verify_each_tick(mut self, on: bool) -> Self {
        self.verify_each_tick = on;
        self
    }

    /// Validate inputs, place every actor and return a ready-to-run
    /// [`World`].
    pub fn build(self) -> SimResult<World<P>> {
        if self.config.timestep_ms == 0 {
            return Err(SimError::Config("timestep_ms must be positive".into()));
        }
        let actor_count = self.actors.count;

        // ── Validate and resolve optional inputs ──────────────────────────
        let mut placements: Vec<(ActorId, Placement)> = Vec::new();
        if let Some(bulk) = self.bulk {
            if bulk.len() != actor_count {
                return Err(SimError::ActorCountMismatch {
                    expected: actor_count,
                    got:      bulk.len(),
                    what:     "placements",
                });
            }
            placements.extend(
                bulk.into_iter()
                    .enumerate()
                    .filter_map(|(i, p)| p.map(|p| (ActorId(i as u32), p))),
            );
        }
        placements.extend(self.placements);

        // ── Build the movement core and place actors ──────────────────────
        let rng = SimRng::new(self.config.seed);
        let mut engine =
            MobileEngine::with_path_finder(self.grid, self.locomotors, self.actors, rng, self.path_finder);
        for (actor, placement) in placements {
            match placement {
                Placement::Mobile(info, init) => engine.spawn(actor, info, init)?,
                Placement::Static(cell, sub) => engine.add_static(actor, cell, sub)?,
            }
        }
        // Make the initial positions visible to area queries.
        engine.flush_positions();

        Ok(World::new(self.config, engine, self.verify_each_tick))
    }
}
