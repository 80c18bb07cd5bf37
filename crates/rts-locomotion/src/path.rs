//! Path-search trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! The mobile layer asks for paths through the [`PathFinder`] trait and only
//! consumes the resulting cell sequence one step at a time.  The default
//! [`DijkstraPathFinder`] is a plain uniform-cost search over the 8
//! neighbours of each cell plus layer transitions at the same `(x, y)`, with
//! every step priced by [`Locomotor::movement_cost_to_enter_cell`].
//!
//! # Determinism
//!
//! Heap entries are `(cost, CPos)`; ties on cost are broken by the cell's
//! `Ord`, so every peer expands cells in the same order and returns the same
//! path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::trace;
use rustc_hash::FxHashMap;

use rts_core::{ActorId, CPos, CVec};

use crate::locomotor::{BlockingMode, Locomotor, MoveContext};

/// Default cap on expanded cells per search.
pub const DEFAULT_MAX_EXPANSIONS: usize = 1 << 16;

// ── PathFinder trait ──────────────────────────────────────────────────────────

/// Pluggable path search.
pub trait PathFinder {
    /// Cells to step through from `from` (exclusive) to `to` (inclusive).
    ///
    /// An empty `Vec` means no path (or `from == to`).  `mover` is ignored by
    /// the blocking checks so an actor never blocks its own path.
    fn find_path(
        &self,
        ctx: &MoveContext<'_>,
        locomotor: &Locomotor,
        mover: ActorId,
        from: CPos,
        to: CPos,
        mode: BlockingMode,
    ) -> Vec<CPos>;
}

// ── DijkstraPathFinder ────────────────────────────────────────────────────────

/// Uniform-cost search over the cell grid and its custom layers.
#[derive(Clone, Copy, Debug)]
pub struct DijkstraPathFinder {
    pub max_expansions: usize,
}

impl Default for DijkstraPathFinder {
    fn default() -> Self {
        Self { max_expansions: DEFAULT_MAX_EXPANSIONS }
    }
}

impl PathFinder for DijkstraPathFinder {
    fn find_path(
        &self,
        ctx: &MoveContext<'_>,
        locomotor: &Locomotor,
        mover: ActorId,
        from: CPos,
        to: CPos,
        mode: BlockingMode,
    ) -> Vec<CPos> {
        if from == to {
            return Vec::new();
        }
        if !locomotor.movement_cost_for_cell(ctx.grid, to).is_passable() {
            trace!("path {from} -> {to}: target impassable for {}", locomotor.name());
            return Vec::new();
        }

        let mut dist: FxHashMap<CPos, u64> = FxHashMap::default();
        let mut prev: FxHashMap<CPos, CPos> = FxHashMap::default();
        let mut heap: BinaryHeap<Reverse<(u64, CPos)>> = BinaryHeap::new();
        dist.insert(from, 0);
        heap.push(Reverse((0, from)));

        let mut expanded = 0usize;
        while let Some(Reverse((cost, cell))) = heap.pop() {
            if cell == to {
                return reconstruct(&prev, from, to);
            }
            // Skip stale heap entries.
            if dist.get(&cell).is_some_and(|&d| cost > d) {
                continue;
            }
            expanded += 1;
            if expanded > self.max_expansions {
                break;
            }

            for next in neighbours(ctx, cell) {
                let step = locomotor.movement_cost_to_enter_cell(ctx, Some(mover), cell, next, mode, None);
                let Some(step) = step.value() else { continue };
                let new_cost = cost + step as u64;
                if dist.get(&next).is_none_or(|&d| new_cost < d) {
                    dist.insert(next, new_cost);
                    prev.insert(next, cell);
                    heap.push(Reverse((new_cost, next)));
                }
            }
        }

        trace!("path {from} -> {to}: no route after {expanded} expansions");
        Vec::new()
    }
}

/// Same-layer neighbours, then layer transitions at the same `(x, y)`.
fn neighbours(ctx: &MoveContext<'_>, cell: CPos) -> Vec<CPos> {
    let mut out: Vec<CPos> = CVec::DIRECTIONS.iter().map(|&d| cell + d).collect();
    if cell.layer == 0 {
        out.extend(ctx.grid.layers.iter().map(|l| cell.on_layer(l.index())));
    } else {
        out.push(cell.on_layer(0));
    }
    out
}

fn reconstruct(prev: &FxHashMap<CPos, CPos>, from: CPos, to: CPos) -> Vec<CPos> {
    let mut path = vec![to];
    let mut cur = to;
    while let Some(&p) = prev.get(&cur) {
        if p == from {
            break;
        }
        path.push(p);
        cur = p;
    }
    path.reverse();
    path
}
