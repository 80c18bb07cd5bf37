//! `Grid`: the ground map plus custom layers behind one cell API.
//!
//! Every layer-dependent question ("is this cell on the map?", "where is
//! its center?", "what terrain is it?") goes through `Grid`, which answers
//! from the [`TerrainMap`] for layer 0 and from the [`LayerRegistry`]
//! otherwise.

use rts_core::{CPos, SubCell, TerrainIndex, WPos};

use crate::{CustomMovementLayer, LayerRegistry, TerrainMap};

pub struct Grid {
    pub map:    TerrainMap,
    pub layers: LayerRegistry,
}

impl Grid {
    pub fn new(map: TerrainMap, layers: LayerRegistry) -> Self {
        Self { map, layers }
    }

    /// A grid with no custom layers.
    pub fn ground_only(map: TerrainMap) -> Self {
        Self::new(map, LayerRegistry::new())
    }

    #[inline]
    pub fn layer(&self, index: u8) -> Option<&dyn CustomMovementLayer> {
        if index == 0 { None } else { self.layers.get(index) }
    }

    /// `true` if `cell` exists: inside the map for the ground, or a defined
    /// cell of a registered layer.
    pub fn contains(&self, cell: CPos) -> bool {
        if !self.map.contains_xy(cell.x, cell.y) {
            return false;
        }
        match self.layer(cell.layer) {
            None if cell.layer == 0 => true,
            None => false,
            Some(l) => l.terrain_index(cell).is_valid(),
        }
    }

    pub fn terrain_index(&self, cell: CPos) -> TerrainIndex {
        if cell.layer == 0 {
            return self.map.terrain_at(cell.x, cell.y);
        }
        self.layer(cell.layer)
            .map_or(TerrainIndex::INVALID, |l| l.terrain_index(cell))
    }

    pub fn center_of_cell(&self, cell: CPos) -> WPos {
        match self.layer(cell.layer) {
            Some(l) => l.center_of_cell(cell),
            None => self.map.center_of_cell(cell.x, cell.y),
        }
    }

    pub fn center_of_sub_cell(&self, cell: CPos, sub: SubCell) -> WPos {
        self.center_of_cell(cell) + self.map.offset_of_sub_cell(sub)
    }

    /// Ground cell containing `pos`.  World positions alone cannot name a
    /// custom layer.
    #[inline]
    pub fn cell_containing(&self, pos: WPos) -> CPos {
        self.map.cell_containing(pos)
    }

    /// `true` when ground-layer crush and blocking rules apply at `cell`:
    /// on the ground itself or on a layer that interacts with it.
    pub fn is_at_ground_level(&self, cell: CPos) -> bool {
        cell.layer == 0
            || self
                .layer(cell.layer)
                .is_some_and(|l| l.interacts_with_default_layer())
    }

    /// Whether an actor may idle at `cell` as far as the layer is concerned.
    pub fn allows_idle(&self, cell: CPos) -> bool {
        match self.layer(cell.layer) {
            Some(l) => l.allows_idle(cell),
            None => cell.layer == 0,
        }
    }

    /// Cells whose distance from `center` lies in `min_range..=max_range`,
    /// nearest first.  Ties are broken by row then column, so the order is
    /// the same on every peer.  Cells keep `center`'s layer and are not
    /// filtered by [`contains`](Self::contains).
    pub fn cells_in_annulus(&self, center: CPos, min_range: i32, max_range: i32) -> Vec<CPos> {
        let (min2, max2) = (min_range * min_range, max_range * max_range);
        let mut cells: Vec<(i32, i32, i32)> = Vec::new();
        for dy in -max_range..=max_range {
            for dx in -max_range..=max_range {
                let d2 = dx * dx + dy * dy;
                if d2 >= min2 && d2 <= max2 {
                    cells.push((d2, dy, dx));
                }
            }
        }
        cells.sort_unstable();
        cells
            .into_iter()
            .map(|(_, dy, dx)| CPos::with_layer(center.x + dx, center.y + dy, center.layer))
            .collect()
    }
}
