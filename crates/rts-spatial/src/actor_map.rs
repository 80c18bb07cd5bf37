//! `ActorMap`: the world-wide spatial occupancy index.
//!
//! # Influence
//!
//! An actor's *influence* is its registration at the `(cell, sub-cell)`
//! pairs reported by its [`OccupySpace::occupied_cells`] projection.  All
//! occupancy mutation funnels through [`ActorMap::add_influence`] and
//! [`ActorMap::remove_influence`]; a reverse index (actor → registered
//! pairs) makes both idempotent and lets [`ActorMap::verify`] check the
//! index against the projection in one place.
//!
//! Occupants of a cell are kept sorted by `ActorId`, so every query returns
//! the same order on every peer regardless of insertion history.
//!
//! # Positions
//!
//! Actor center positions are also indexed in an R-tree for area queries.
//! Position changes are buffered and applied in [`ActorMap::tick`], so
//! [`ActorMap::actors_in_box`] sees a single consistent snapshot for the
//! whole tick.

use std::collections::{BTreeMap, BTreeSet};

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use rts_core::{ActorId, CPos, SubCell, WPos};

use crate::{Grid, SpatialError, SpatialResult};

/// The cell/sub-cell pairs an actor occupies.  Two entries at most while in
/// transit, one otherwise.
pub type OccupiedCells = SmallVec<[(CPos, SubCell); 2]>;

/// Anything that occupies space in the world.
pub trait OccupySpace {
    fn occupied_cells(&self) -> OccupiedCells;
    fn center_position(&self) -> WPos;
}

/// One registration in a cell.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InfluenceEntry {
    pub actor: ActorId,
    pub sub:   SubCell,
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Debug)]
struct ActorPoint {
    point: [i64; 2],
    actor: ActorId,
}

impl RTreeObject for ActorPoint {
    type Envelope = AABB<[i64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for ActorPoint {
    fn distance_2(&self, point: &[i64; 2]) -> i64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

#[inline]
fn to_point(pos: WPos) -> [i64; 2] {
    [pos.x as i64, pos.y as i64]
}

// ── ActorMap ──────────────────────────────────────────────────────────────────

pub struct ActorMap {
    sub_cell_count:   u8,
    default_sub_cell: SubCell,

    /// Forward index: cell → occupants sorted by actor.
    influence: FxHashMap<CPos, SmallVec<[InfluenceEntry; 2]>>,

    /// Reverse index: actor → pairs it is registered at.
    registered: FxHashMap<ActorId, OccupiedCells>,

    // ── Positions ─────────────────────────────────────────────────────────
    positions:       RTree<ActorPoint>,
    position_of:     FxHashMap<ActorId, [i64; 2]>,
    pending_adds:    BTreeMap<ActorId, [i64; 2]>,
    pending_removes: BTreeSet<ActorId>,
}

impl ActorMap {
    /// Create an empty index sized for `grid`'s sub-cell layout.
    pub fn new(grid: &Grid) -> Self {
        Self::with_sub_cells(grid.map.sub_cell_count(), grid.map.default_sub_cell())
    }

    pub fn with_sub_cells(sub_cell_count: u8, default_sub_cell: SubCell) -> Self {
        Self {
            sub_cell_count,
            default_sub_cell,
            influence:       FxHashMap::default(),
            registered:      FxHashMap::default(),
            positions:       RTree::new(),
            position_of:     FxHashMap::default(),
            pending_adds:    BTreeMap::new(),
            pending_removes: BTreeSet::new(),
        }
    }

    /// Drop every registration and position.  Called when the world is torn
    /// down.
    pub fn teardown(&mut self) {
        self.influence.clear();
        self.registered.clear();
        self.positions = RTree::new();
        self.position_of.clear();
        self.pending_adds.clear();
        self.pending_removes.clear();
    }

    // ── Influence ─────────────────────────────────────────────────────────

    /// Register `actor` at `occupant.occupied_cells()`.
    ///
    /// Idempotent: if the actor is already registered at exactly these pairs
    /// nothing changes; if it is registered elsewhere, the old registration
    /// is removed first.
    pub fn add_influence<O: OccupySpace + ?Sized>(&mut self, actor: ActorId, occupant: &O) {
        let cells = occupant.occupied_cells();
        if self.registered.get(&actor) == Some(&cells) {
            return;
        }
        self.remove_influence(actor);
        if cells.is_empty() {
            return;
        }
        for &(cell, sub) in &cells {
            let entries = self.influence.entry(cell).or_default();
            let at = entries.partition_point(|e| e.actor < actor);
            entries.insert(at, InfluenceEntry { actor, sub });
        }
        self.registered.insert(actor, cells);
    }

    /// Remove every registration of `actor`.  Returns `false` if it had none.
    pub fn remove_influence(&mut self, actor: ActorId) -> bool {
        let Some(cells) = self.registered.remove(&actor) else {
            return false;
        };
        for (cell, _) in cells {
            if let Some(entries) = self.influence.get_mut(&cell) {
                entries.retain(|e| e.actor != actor);
                if entries.is_empty() {
                    self.influence.remove(&cell);
                }
            }
        }
        true
    }

    /// Re-derive `actor`'s registration from its current projection.
    ///
    /// Used when a status change alters what an actor reports as occupied
    /// without an explicit `SetLocation`.
    pub fn update_occupied_cells<O: OccupySpace + ?Sized>(&mut self, actor: ActorId, occupant: &O) {
        self.remove_influence(actor);
        self.add_influence(actor, occupant);
    }

    /// Pairs `actor` is currently registered at (empty if none).
    pub fn registered_cells(&self, actor: ActorId) -> &[(CPos, SubCell)] {
        self.registered.get(&actor).map_or(&[], |c| c.as_slice())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Raw occupants of `cell`, sorted by actor.
    #[inline]
    pub fn occupants(&self, cell: CPos) -> &[InfluenceEntry] {
        self.influence.get(&cell).map_or(&[], |e| e.as_slice())
    }

    /// All actors at `cell`, ascending.
    pub fn actors_at(&self, cell: CPos) -> impl Iterator<Item = ActorId> + '_ {
        self.occupants(cell).iter().map(|e| e.actor)
    }

    /// Actors whose slot overlaps `sub` (see [`SubCell::overlaps`]).
    pub fn actors_at_sub(&self, cell: CPos, sub: SubCell) -> impl Iterator<Item = ActorId> + '_ {
        self.occupants(cell)
            .iter()
            .filter(move |e| e.sub.overlaps(sub))
            .map(|e| e.actor)
    }

    #[inline]
    pub fn any_actors_at(&self, cell: CPos) -> bool {
        !self.occupants(cell).is_empty()
    }

    pub fn any_actors_at_sub(&self, cell: CPos, sub: SubCell) -> bool {
        self.actors_at_sub(cell, sub).next().is_some()
    }

    /// `true` if any occupant overlapping `sub` passes `blocks`.
    pub fn any_actors_at_filtered<F>(&self, cell: CPos, sub: SubCell, mut blocks: F) -> bool
    where
        F: FnMut(ActorId) -> bool,
    {
        self.actors_at_sub(cell, sub).any(|a| blocks(a))
    }

    /// A sub-cell of `cell` not taken by any occupant that `blocks`.
    ///
    /// Preference order: `preferred` (if it is concrete and free),
    /// the map default when no blocking occupant is present at all, then the
    /// first free numbered slot.  Returns `SubCell::Invalid` when every slot
    /// is taken.
    pub fn free_sub_cell<F>(&self, cell: CPos, preferred: SubCell, mut blocks: F) -> SubCell
    where
        F: FnMut(ActorId) -> bool,
    {
        if preferred.is_concrete() && !self.any_actors_at_filtered(cell, preferred, &mut blocks) {
            return preferred;
        }
        if !self.any_actors_at_filtered(cell, SubCell::Any, &mut blocks) {
            return self.default_sub_cell;
        }
        (1..=self.sub_cell_count)
            .map(SubCell::Index)
            .find(|&s| !self.any_actors_at_filtered(cell, s, &mut blocks))
            .unwrap_or(SubCell::Invalid)
    }

    pub fn has_free_sub_cell<F>(&self, cell: CPos, blocks: F) -> bool
    where
        F: FnMut(ActorId) -> bool,
    {
        self.free_sub_cell(cell, SubCell::Any, blocks) != SubCell::Invalid
    }

    // ── Positions ─────────────────────────────────────────────────────────

    /// Queue `actor`'s center position for the next [`tick`](Self::tick).
    pub fn update_position(&mut self, actor: ActorId, pos: WPos) {
        self.pending_removes.remove(&actor);
        self.pending_adds.insert(actor, to_point(pos));
    }

    /// Queue removal of `actor`'s position.
    pub fn remove_position(&mut self, actor: ActorId) {
        self.pending_adds.remove(&actor);
        self.pending_removes.insert(actor);
    }

    /// Apply buffered position changes, removals first, in actor order.
    pub fn tick(&mut self) {
        let removes = std::mem::take(&mut self.pending_removes);
        for actor in removes {
            if let Some(point) = self.position_of.remove(&actor) {
                self.positions.remove(&ActorPoint { point, actor });
            }
        }
        let adds = std::mem::take(&mut self.pending_adds);
        for (actor, point) in adds {
            if let Some(old) = self.position_of.insert(actor, point) {
                self.positions.remove(&ActorPoint { point: old, actor });
            }
            self.positions.insert(ActorPoint { point, actor });
        }
    }

    /// Actors whose center lies inside the box spanned by `a` and `b`
    /// (inclusive), ascending.  Reflects positions as of the last `tick`.
    pub fn actors_in_box(&self, a: WPos, b: WPos) -> Vec<ActorId> {
        let envelope = AABB::from_corners(to_point(a), to_point(b));
        let mut out: Vec<ActorId> = self
            .positions
            .locate_in_envelope(&envelope)
            .map(|p| p.actor)
            .collect();
        out.sort_unstable();
        out
    }

    /// Actors within `range` world units of `pos`, ascending.
    pub fn actors_in_circle(&self, pos: WPos, range: i64) -> Vec<ActorId> {
        let mut out: Vec<ActorId> = self
            .positions
            .locate_within_distance(to_point(pos), range * range)
            .map(|p| p.actor)
            .collect();
        out.sort_unstable();
        out
    }

    // ── Consistency ───────────────────────────────────────────────────────

    /// Check `actor`'s registration against its projection and that every
    /// registered pair is present in the forward index.
    pub fn verify<O: OccupySpace + ?Sized>(&self, actor: ActorId, occupant: &O) -> SpatialResult<()> {
        let expected = occupant.occupied_cells();
        let actual = self.registered_cells(actor);
        if actual != expected.as_slice() {
            return Err(SpatialError::Inconsistent {
                actor,
                detail: format!("registered at {actual:?}, projection is {expected:?}"),
            });
        }
        for &(cell, sub) in actual {
            if !self.occupants(cell).contains(&InfluenceEntry { actor, sub }) {
                return Err(SpatialError::Inconsistent {
                    actor,
                    detail: format!("missing from cell {cell} slot {sub}"),
                });
            }
        }
        Ok(())
    }

    /// Check that the forward index holds no entry the reverse index does
    /// not know about (stale registrations).
    pub fn verify_no_stale_entries(&self) -> SpatialResult<()> {
        for (&cell, entries) in &self.influence {
            for e in entries {
                if !self.registered_cells(e.actor).contains(&(cell, e.sub)) {
                    return Err(SpatialError::Inconsistent {
                        actor:  e.actor,
                        detail: format!("stale entry at {cell} slot {}", e.sub),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of cells with at least one occupant.
    pub fn occupied_cell_count(&self) -> usize {
        self.influence.len()
    }
}
