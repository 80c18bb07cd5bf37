//! `MobileEngine`: owns the world's movement state and advances it per tick.
//!
//! # Tick order
//!
//! 1. Every live actor with a mobile, ascending `ActorId`:
//!    run the front move directive, queue a return to the ground if idle on
//!    a layer that asks for it, derive movement types from the actual change
//!    in center and facing, then flush that actor's events.
//! 2. Resolve the nudge requests raised during step 1.
//! 3. Apply buffered position-index updates (`ActorMap::tick`).
//!
//! # Borrowing
//!
//! While an actor is processed its `Mobile` is taken out of the store and
//! handed to the engine's methods next to `&mut self`.  Locomotor and
//! occupancy questions are answered through short-lived [`MoveContext`]s.

use std::collections::BTreeMap;

use log::{debug, trace};

use rts_actor::ActorStore;
use rts_core::{ActorId, CPos, MovementType, SimRng, SubCell, Tick, WPos};
use rts_locomotion::{BlockingMode, DijkstraPathFinder, Locomotor, LocomotorSet, MoveContext, PathFinder};
use rts_spatial::{ActorMap, Grid};

use crate::activity::ActivityState;
use crate::nudge::NudgeCause;
use crate::store::{StaticOccupant, StaticOccupants};
use crate::{
    Mobile, MobileError, MobileInfo, MobileInit, MobileResult, MobileStatus, MobileStore, MoveActivity,
    MovementEvent, ObserverRegistry,
};

/// Owns every piece of state the movement core mutates.
///
/// # Type parameter
///
/// `P` is the path search used by move directives.  Swap it at compile time
/// for a different search with no runtime overhead.
pub struct MobileEngine<P: PathFinder = DijkstraPathFinder> {
    pub path_finder: P,
    /// Receives every movement event, in the order described in
    /// [`crate::events`].
    pub observers:   ObserverRegistry,

    pub(crate) grid:       Grid,
    pub(crate) actor_map:  ActorMap,
    pub(crate) locomotors: LocomotorSet,
    pub(crate) actors:     ActorStore,
    pub(crate) store:      MobileStore,
    pub(crate) statics:    StaticOccupants,
    pub(crate) rng:        SimRng,
    pub(crate) now:        Tick,
    /// Pending nudges: target → first nudger this tick.
    pub(crate) nudges:     BTreeMap<ActorId, (ActorId, NudgeCause)>,

    /// Raised but not yet dispatched.
    pending: Vec<MovementEvent>,
    /// Dispatched since the last `take_events`.
    log:     Vec<MovementEvent>,
}

impl MobileEngine<DijkstraPathFinder> {
    pub fn new(grid: Grid, locomotors: LocomotorSet, actors: ActorStore, rng: SimRng) -> Self {
        Self::with_path_finder(grid, locomotors, actors, rng, DijkstraPathFinder::default())
    }
}

impl<P: PathFinder> MobileEngine<P> {
    pub fn with_path_finder(
        grid: Grid,
        locomotors: LocomotorSet,
        actors: ActorStore,
        rng: SimRng,
        path_finder: P,
    ) -> Self {
        let actor_map = ActorMap::new(&grid);
        Self {
            path_finder,
            observers: ObserverRegistry::new(),
            grid,
            actor_map,
            locomotors,
            actors,
            store: MobileStore::new(),
            statics: StaticOccupants::new(),
            rng,
            now: Tick::ZERO,
            nudges: BTreeMap::new(),
            pending: Vec::new(),
            log: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn actor_map(&self) -> &ActorMap {
        &self.actor_map
    }

    #[inline]
    pub fn actors(&self) -> &ActorStore {
        &self.actors
    }

    #[inline]
    pub fn locomotors(&self) -> &LocomotorSet {
        &self.locomotors
    }

    #[inline]
    pub fn mobiles(&self) -> &MobileStore {
        &self.store
    }

    pub fn mobile(&self, actor: ActorId) -> Option<&Mobile> {
        self.store.get(actor)
    }

    pub fn static_occupant(&self, actor: ActorId) -> Option<&StaticOccupant> {
        self.statics.get(&actor)
    }

    /// The tick most recently passed to [`tick`](Self::tick).
    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Occupancy view for locomotor queries.
    pub fn ctx(&self) -> MoveContext<'_> {
        MoveContext {
            grid:      &self.grid,
            actor_map: &self.actor_map,
            actors:    &self.actors,
            motion:    &self.store,
        }
    }

    pub(crate) fn locomotor(&self, m: &Mobile) -> MobileResult<&Locomotor> {
        self.locomotors
            .get(m.info.locomotor)
            .ok_or(MobileError::UnknownLocomotor(m.info.locomotor))
    }

    /// The locomotor `actor` moves with.
    pub fn locomotor_of(&self, actor: ActorId) -> MobileResult<&Locomotor> {
        let m = self.store.get(actor).ok_or(MobileError::NoMobile(actor))?;
        self.locomotor(m)
    }

    /// Run `f` with `actor`'s mobile taken out of the store.
    fn with_mobile<R>(
        &mut self,
        actor: ActorId,
        f: impl FnOnce(&mut Self, &mut Mobile) -> MobileResult<R>,
    ) -> MobileResult<R> {
        let mut m = self.store.take(actor).ok_or(MobileError::NoMobile(actor))?;
        let result = f(self, &mut m);
        self.store.put(actor, m);
        result
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub(crate) fn emit(&mut self, event: MovementEvent) {
        self.pending.push(event);
    }

    fn flush_events(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let mut batch = std::mem::take(&mut self.pending);
        batch.sort_by_key(MovementEvent::rank);
        for event in &batch {
            self.observers.dispatch(event);
        }
        self.log.append(&mut batch);
    }

    /// Every event dispatched since the last call, in dispatch order.
    pub fn take_events(&mut self) -> Vec<MovementEvent> {
        std::mem::take(&mut self.log)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Give `actor` a mobile and add it to the world.
    ///
    /// A `MobileInit::Cell` sub-cell is validated like in
    /// [`set_position`](Self::set_position).  Placement ignores occupancy.
    pub fn spawn(&mut self, actor: ActorId, info: MobileInfo, init: MobileInit) -> MobileResult<()> {
        self.actors.check(actor)?;
        if !self.actors.is_alive(actor) {
            return Err(MobileError::Dead(actor));
        }
        if self.store.contains(actor) || self.statics.contains_key(&actor) {
            return Err(MobileError::AlreadyMobile(actor));
        }
        let shares_cell = self
            .locomotors
            .get(info.locomotor)
            .ok_or(MobileError::UnknownLocomotor(info.locomotor))?
            .shares_cell();

        let (cell, sub, center) = match init {
            MobileInit::Cell(cell, sub) => {
                let sub = self.resolve_sub_cell(shares_cell, sub);
                (cell, sub, self.grid.center_of_sub_cell(cell, sub))
            }
            MobileInit::Position(pos) => {
                let cell = self.grid.cell_containing(pos);
                (cell, self.sub_cell_at(shares_cell, pos), pos)
            }
        };
        if !self.grid.contains(cell) {
            return Err(MobileError::OffGrid { actor, cell });
        }

        debug!("{actor}: spawned at {cell} ({sub})");
        self.store.insert(actor, Mobile::new(info, cell, sub, center));
        self.add_to_world(actor)
    }

    /// Register an actor that occupies `cell` and never moves.
    pub fn add_static(&mut self, actor: ActorId, cell: CPos, sub: SubCell) -> MobileResult<()> {
        self.actors.check(actor)?;
        if !self.actors.is_alive(actor) {
            return Err(MobileError::Dead(actor));
        }
        if self.store.contains(actor) || self.statics.contains_key(&actor) {
            return Err(MobileError::AlreadyMobile(actor));
        }
        if !self.grid.contains(cell) {
            return Err(MobileError::OffGrid { actor, cell });
        }
        let sub = if sub.is_concrete() { sub } else { SubCell::FullCell };
        let occupant = StaticOccupant { cell, sub, center: self.grid.center_of_sub_cell(cell, sub) };
        self.actor_map.add_influence(actor, &occupant);
        self.actor_map.update_position(actor, occupant.center);
        self.statics.insert(actor, occupant);
        Ok(())
    }

    pub fn add_to_world(&mut self, actor: ActorId) -> MobileResult<()> {
        let m = self.store.get_mut(actor).ok_or(MobileError::NoMobile(actor))?;
        m.in_world = true;
        self.actor_map.add_influence(actor, &*m);
        if m.status != MobileStatus::Disabled {
            self.actor_map.update_position(actor, m.center);
        }
        Ok(())
    }

    /// Drop `actor`'s occupancy and position.  Its state is kept for a later
    /// [`add_to_world`](Self::add_to_world).
    pub fn remove_from_world(&mut self, actor: ActorId) -> MobileResult<()> {
        let m = self.store.get_mut(actor).ok_or(MobileError::NoMobile(actor))?;
        m.in_world = false;
        m.is_blocking = false;
        self.actor_map.remove_influence(actor);
        self.actor_map.remove_position(actor);
        Ok(())
    }

    /// Clear the occupancy index and take every mobile out of the world.
    pub fn teardown(&mut self) {
        self.actor_map.teardown();
        let ids: Vec<ActorId> = self.store.actor_ids().collect();
        for actor in ids {
            if let Some(m) = self.store.get_mut(actor) {
                m.in_world = false;
                m.activities.clear();
            }
        }
        self.statics.clear();
        self.nudges.clear();
    }

    /// Apply buffered position updates now rather than at the end of the
    /// next tick.
    pub fn flush_positions(&mut self) {
        self.actor_map.tick();
    }

    /// Change the enabled/paused/disabled toggle.  Occupancy is re-derived
    /// from the new status.
    pub fn set_status(&mut self, actor: ActorId, status: MobileStatus) -> MobileResult<()> {
        let m = self.store.get_mut(actor).ok_or(MobileError::NoMobile(actor))?;
        if m.status == status {
            return Ok(());
        }
        debug!("{actor}: {:?} -> {status:?}", m.status);
        m.status = status;
        if status != MobileStatus::Enabled {
            m.is_blocking = false;
        }
        self.actor_map.update_occupied_cells(actor, &*m);
        if m.in_world && status != MobileStatus::Disabled {
            self.actor_map.update_position(actor, m.center);
        } else {
            self.actor_map.remove_position(actor);
        }
        Ok(())
    }

    // ── Location ──────────────────────────────────────────────────────────

    /// The one writer of location fields.  Removes influence at the old
    /// cells, updates the fields and re-adds influence; raises
    /// `LayerChanged` iff `from` and `to` are on different layers.
    pub(crate) fn set_location(
        &mut self,
        actor: ActorId,
        m: &mut Mobile,
        from: CPos,
        from_sub: SubCell,
        to: CPos,
        to_sub: SubCell,
    ) {
        if (m.from_cell, m.from_sub, m.to_cell, m.to_sub) == (from, from_sub, to, to_sub) {
            return;
        }
        self.actor_map.remove_influence(actor);
        m.from_cell = from;
        m.from_sub = from_sub;
        m.to_cell = to;
        m.to_sub = to_sub;
        m.is_blocking = false;
        if m.in_world {
            self.actor_map.add_influence(actor, &*m);
        }
        if from.layer != to.layer {
            self.emit(MovementEvent::LayerChanged { actor, from_layer: from.layer, to_layer: to.layer });
        }
    }

    /// `preferred` if it is a sub-position of this map, else the map default;
    /// `FullCell` for locomotors that do not share cells.
    fn resolve_sub_cell(&self, shares_cell: bool, preferred: SubCell) -> SubCell {
        if !shares_cell {
            return SubCell::FullCell;
        }
        match preferred {
            SubCell::Index(i) if i >= 1 && i <= self.grid.map.sub_cell_count() => preferred,
            _ => self.grid.map.default_sub_cell(),
        }
    }

    fn sub_cell_at(&self, shares_cell: bool, pos: WPos) -> SubCell {
        if shares_cell {
            self.grid.map.nearest_sub_cell(pos)
        } else {
            SubCell::FullCell
        }
    }

    /// Teleport to `cell`, dropping every queued directive.
    ///
    /// An unusable `sub` is replaced by the map default.  Occupancy is not
    /// checked; crushes at the destination resolve as after a normal step.
    pub fn set_position(&mut self, actor: ActorId, cell: CPos, sub: SubCell) -> MobileResult<()> {
        if !self.grid.contains(cell) {
            return Err(MobileError::OffGrid { actor, cell });
        }
        self.with_mobile(actor, |engine, m| {
            let sub = engine.resolve_sub_cell(engine.locomotor(m)?.shares_cell(), sub);
            let center = engine.grid.center_of_sub_cell(cell, sub);
            engine.teleport(actor, m, cell, sub, center)
        })?;
        self.flush_events();
        Ok(())
    }

    /// Teleport to the ground cell containing `pos`, keeping `pos` as the
    /// exact center.
    pub fn set_position_world(&mut self, actor: ActorId, pos: WPos) -> MobileResult<()> {
        let cell = self.grid.cell_containing(pos);
        if !self.grid.contains(cell) {
            return Err(MobileError::OffGrid { actor, cell });
        }
        self.with_mobile(actor, |engine, m| {
            let sub = engine.sub_cell_at(engine.locomotor(m)?.shares_cell(), pos);
            engine.teleport(actor, m, cell, sub, pos)
        })?;
        self.flush_events();
        Ok(())
    }

    fn teleport(&mut self, actor: ActorId, m: &mut Mobile, cell: CPos, sub: SubCell, center: WPos) -> MobileResult<()> {
        m.activities.clear();
        self.set_location(actor, m, cell, sub, cell, sub);
        m.center = center;
        m.old_center = center;
        m.old_facing = m.facing;
        if m.in_world && m.status != MobileStatus::Disabled {
            self.actor_map.update_position(actor, center);
        }
        trace!("{actor}: teleported to {cell} ({sub})");
        self.finished_moving(actor, m, cell)
    }

    // ── Directives ────────────────────────────────────────────────────────

    /// Queue a move to `target`, ending early within `near_enough` cells of
    /// it when blocked.
    ///
    /// Unless `queued`, current directives are cancelled first (a step in
    /// progress still finishes).  Returns `false` if the actor cannot take
    /// orders: dead, outside the world, paused or disabled.
    pub fn move_to(&mut self, actor: ActorId, target: CPos, near_enough: i32, queued: bool) -> MobileResult<bool> {
        self.actors.check(actor)?;
        let alive = self.actors.is_alive(actor);
        let m = self.store.get_mut(actor).ok_or(MobileError::NoMobile(actor))?;
        if !alive || !m.in_world || m.status != MobileStatus::Enabled {
            return Ok(false);
        }
        if !queued {
            m.cancel_activities();
        }
        m.activities.push_back(MoveActivity::new(target, near_enough));
        debug!("{actor}: move to {target} (near enough {near_enough}, queued {queued})");
        Ok(true)
    }

    /// Stop: drop queued directives and cancel the current one.
    pub fn cancel(&mut self, actor: ActorId) -> MobileResult<()> {
        let m = self.store.get_mut(actor).ok_or(MobileError::NoMobile(actor))?;
        m.cancel_activities();
        Ok(())
    }

    /// The nearest cell to `target` (within `min_range..=max_range` cells)
    /// that `actor` could enter and stay in right now.
    pub fn nearest_moveable_cell(
        &self,
        actor: ActorId,
        target: CPos,
        min_range: i32,
        max_range: i32,
    ) -> MobileResult<Option<CPos>> {
        let m = self.store.get(actor).ok_or(MobileError::NoMobile(actor))?;
        self.nearest_moveable_cell_for(actor, m, target, min_range, max_range)
    }

    pub(crate) fn nearest_moveable_cell_for(
        &self,
        actor: ActorId,
        m: &Mobile,
        target: CPos,
        min_range: i32,
        max_range: i32,
    ) -> MobileResult<Option<CPos>> {
        let loco = self.locomotor(m)?;
        let ctx = self.ctx();
        Ok(self
            .grid
            .cells_in_annulus(target, min_range, max_range)
            .into_iter()
            .find(|&c| {
                self.grid.contains(c)
                    && loco.can_stay_in_cell(&self.grid, c)
                    && loco.can_enter_cell(&ctx, Some(actor), c, BlockingMode::All, None)
            }))
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Advance the whole movement core by one tick.
    pub fn tick(&mut self, now: Tick) -> MobileResult<()> {
        self.now = now;
        let ids: Vec<ActorId> = self.store.actor_ids().collect();
        for actor in ids {
            if !self.actors.is_alive(actor) {
                continue;
            }
            self.with_mobile(actor, |engine, m| engine.tick_mobile(actor, m))?;
            self.flush_events();
        }
        self.resolve_nudges()?;
        self.flush_events();
        self.actor_map.tick();
        Ok(())
    }

    fn tick_mobile(&mut self, actor: ActorId, m: &mut Mobile) -> MobileResult<()> {
        if !m.in_world {
            return Ok(());
        }
        if m.status == MobileStatus::Enabled {
            if let Some(mut act) = m.activities.pop_front() {
                match self.tick_move(actor, m, &mut act)? {
                    ActivityState::Continue => m.activities.push_front(act),
                    ActivityState::Done => {
                        m.is_blocking = false;
                        trace!("{actor}: directive to {} done", act.target());
                    }
                }
            }
            self.return_to_ground_if_idle(actor, m)?;
        }
        self.update_movement_types(actor, m);
        if m.status != MobileStatus::Disabled {
            self.actor_map.update_position(actor, m.center);
        }
        Ok(())
    }

    /// Idle on a layer that returns its actors to the ground: queue the step
    /// down when the ground cell below can be entered and stayed in.
    fn return_to_ground_if_idle(&mut self, actor: ActorId, m: &mut Mobile) -> MobileResult<()> {
        let here = m.to_cell;
        if !m.is_idle() || here.layer == 0 {
            return Ok(());
        }
        if !self.grid.layer(here.layer).is_some_and(|l| l.return_to_ground_layer_on_idle()) {
            return Ok(());
        }
        let ground = here.on_layer(0);
        let reachable = {
            let loco = self.locomotor(m)?;
            let ctx = self.ctx();
            loco.can_stay_in_cell(&self.grid, ground)
                && loco
                    .movement_cost_to_enter_cell(&ctx, Some(actor), here, ground, BlockingMode::All, None)
                    .is_passable()
                && loco.can_enter_cell(&ctx, Some(actor), ground, BlockingMode::All, None)
        };
        if reachable {
            debug!("{actor}: idle on layer {}, returning to {ground}", here.layer);
            m.activities.push_back(MoveActivity::with_path(ground, vec![ground]));
        }
        Ok(())
    }

    /// Derive movement types from what actually changed since last tick.
    fn update_movement_types(&mut self, actor: ActorId, m: &mut Mobile) {
        let delta = m.center - m.old_center;
        let mut types = MovementType::NONE;
        if delta.x != 0 || delta.y != 0 {
            types |= MovementType::HORIZONTAL;
        }
        if delta.z != 0 {
            types |= MovementType::VERTICAL;
        }
        if m.facing != m.old_facing {
            types |= MovementType::TURN;
        }
        if types != m.movement_types {
            m.movement_types = types;
            self.emit(MovementEvent::MovementTypeChanged { actor, types });
        }
        m.old_center = m.center;
        m.old_facing = m.facing;
    }

    // ── Consistency ───────────────────────────────────────────────────────

    /// Check the occupancy index against every actor's projection.
    pub fn verify(&self) -> MobileResult<()> {
        for (actor, m) in self.store.iter() {
            self.actor_map.verify(actor, m)?;
        }
        for (&actor, s) in &self.statics {
            self.actor_map.verify(actor, s)?;
        }
        self.actor_map.verify_no_stale_entries()?;
        Ok(())
    }
}
