//! Custom movement layers and the registry that owns them.
//!
//! # Layers
//!
//! A custom layer is an alternate cell space stacked over the ground map:
//! elevated bridges, tunnels, subterranean burrows, jump-jet altitude.  Each
//! layer has a non-zero index (the `layer` tag of [`CPos`]), its own
//! center-of-cell mapping and terrain, and a handful of flags:
//!
//! | Flag                              | Meaning                                           |
//! |-----------------------------------|---------------------------------------------------|
//! | `interacts_with_default_layer`    | ground crush/blocking rules apply on this layer   |
//! | `return_to_ground_layer_on_idle`  | idle actors here are sent back to the ground      |
//!
//! Transitions between the ground and a layer only happen at the same
//! `(x, y)` and only through the layer's *portal* cells; the entry and exit
//! costs are added on top of the terrain cost by the locomotor.

use rustc_hash::FxHashMap;

use rts_core::{CELL_SIZE, CPos, TerrainIndex, WPos};

use crate::{SpatialError, SpatialResult};

// ── Trait ─────────────────────────────────────────────────────────────────────

/// An alternate coordinate space that movement can enter and leave.
///
/// Locomotors are identified by name so this crate stays independent of
/// the locomotion crate.
pub trait CustomMovementLayer: Send + Sync {
    /// The `layer` tag of cells on this layer.  Never `0`.
    fn index(&self) -> u8;

    fn interacts_with_default_layer(&self) -> bool;

    fn return_to_ground_layer_on_idle(&self) -> bool;

    fn enabled_for_locomotor(&self, locomotor: &str) -> bool;

    /// Extra cost of stepping from the ground at `cell`'s `(x, y)` onto the
    /// layer.  `None` means no transition is possible there.
    fn entry_movement_cost(&self, locomotor: &str, cell: CPos) -> Option<u32>;

    /// Extra cost of stepping off the layer onto the ground at `cell`.
    fn exit_movement_cost(&self, locomotor: &str, cell: CPos) -> Option<u32>;

    fn center_of_cell(&self, cell: CPos) -> WPos;

    /// Terrain of a layer cell; `INVALID` where the layer has no cell.
    fn terrain_index(&self, cell: CPos) -> TerrainIndex;

    /// Whether an actor may be left idle at `cell`.  Tunnel bores and
    /// similar pass-through cells return `false`.
    fn allows_idle(&self, _cell: CPos) -> bool {
        true
    }
}

// ── GridLayer ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
struct LayerCell {
    terrain:      TerrainIndex,
    height:       i32,
    portal:       bool,
    transit_only: bool,
}

/// A table-driven [`CustomMovementLayer`]: cells, heights and portals are
/// supplied explicitly.
///
/// The presets mirror the usual layer kinds:
///
/// ```
/// use rts_core::TerrainIndex;
/// use rts_spatial::{CustomMovementLayer, GridLayer};
///
/// let bridge = GridLayer::elevated_bridge(1)
///     .with_cell(3, 4, TerrainIndex(0), 512)
///     .with_portal(3, 4);
/// assert!(bridge.interacts_with_default_layer());
/// ```
#[derive(Clone, Debug)]
pub struct GridLayer {
    index:                 u8,
    name:                  String,
    interacts_with_ground: bool,
    return_on_idle:        bool,
    /// `None` = every locomotor may use the layer.
    enabled_for:           Option<Vec<String>>,
    entry_cost:            u32,
    exit_cost:             u32,
    cells:                 FxHashMap<(i32, i32), LayerCell>,
}

impl GridLayer {
    pub fn new(index: u8, name: &str) -> Self {
        Self {
            index,
            name:                  name.to_owned(),
            interacts_with_ground: false,
            return_on_idle:        false,
            enabled_for:           None,
            entry_cost:            0,
            exit_cost:             0,
            cells:                 FxHashMap::default(),
        }
    }

    /// Bridge decks: ground rules apply, actors may idle on them.
    pub fn elevated_bridge(index: u8) -> Self {
        Self::new(index, "elevated-bridge").interacts_with_ground(true)
    }

    /// Tunnels: isolated from the ground layer.
    pub fn tunnel(index: u8) -> Self {
        Self::new(index, "tunnel")
    }

    /// Burrowing units: isolated and surface again when idle.
    pub fn subterranean(index: u8) -> Self {
        Self::new(index, "subterranean").return_on_idle(true)
    }

    /// Hovering jump-jets: over ground cells, land when idle.
    pub fn jumpjet(index: u8) -> Self {
        Self::new(index, "jumpjet")
            .interacts_with_ground(true)
            .return_on_idle(true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interacts_with_ground(mut self, on: bool) -> Self {
        self.interacts_with_ground = on;
        self
    }

    pub fn return_on_idle(mut self, on: bool) -> Self {
        self.return_on_idle = on;
        self
    }

    /// Restrict the layer to the named locomotors.
    pub fn enabled_for<'a, I: IntoIterator<Item = &'a str>>(mut self, locomotors: I) -> Self {
        self.enabled_for = Some(locomotors.into_iter().map(str::to_owned).collect());
        self
    }

    pub fn transition_costs(mut self, entry: u32, exit: u32) -> Self {
        self.entry_cost = entry;
        self.exit_cost = exit;
        self
    }

    /// Add (or replace) a layer cell at `(x, y)` with absolute `height`.
    pub fn with_cell(mut self, x: i32, y: i32, terrain: TerrainIndex, height: i32) -> Self {
        self.cells.insert(
            (x, y),
            LayerCell { terrain, height, portal: false, transit_only: false },
        );
        self
    }

    /// Mark an existing cell as a ground transition point.
    pub fn with_portal(mut self, x: i32, y: i32) -> Self {
        if let Some(c) = self.cells.get_mut(&(x, y)) {
            c.portal = true;
        }
        self
    }

    /// Mark an existing cell as pass-through only.
    pub fn with_transit_only(mut self, x: i32, y: i32) -> Self {
        if let Some(c) = self.cells.get_mut(&(x, y)) {
            c.transit_only = true;
        }
        self
    }

    fn cell(&self, cell: CPos) -> Option<&LayerCell> {
        self.cells.get(&(cell.x, cell.y))
    }

    fn transition_cost(&self, locomotor: &str, cell: CPos, cost: u32) -> Option<u32> {
        if !self.enabled_for_locomotor(locomotor) {
            return None;
        }
        self.cell(cell).filter(|c| c.portal).map(|_| cost)
    }
}

impl CustomMovementLayer for GridLayer {
    fn index(&self) -> u8 {
        self.index
    }

    fn interacts_with_default_layer(&self) -> bool {
        self.interacts_with_ground
    }

    fn return_to_ground_layer_on_idle(&self) -> bool {
        self.return_on_idle
    }

    fn enabled_for_locomotor(&self, locomotor: &str) -> bool {
        self.enabled_for
            .as_ref()
            .is_none_or(|names| names.iter().any(|n| n == locomotor))
    }

    fn entry_movement_cost(&self, locomotor: &str, cell: CPos) -> Option<u32> {
        self.transition_cost(locomotor, cell, self.entry_cost)
    }

    fn exit_movement_cost(&self, locomotor: &str, cell: CPos) -> Option<u32> {
        self.transition_cost(locomotor, cell, self.exit_cost)
    }

    fn center_of_cell(&self, cell: CPos) -> WPos {
        let z = self.cell(cell).map_or(0, |c| c.height);
        WPos::new(CELL_SIZE * cell.x + CELL_SIZE / 2, CELL_SIZE * cell.y + CELL_SIZE / 2, z)
    }

    fn terrain_index(&self, cell: CPos) -> TerrainIndex {
        self.cell(cell).map_or(TerrainIndex::INVALID, |c| c.terrain)
    }

    fn allows_idle(&self, cell: CPos) -> bool {
        self.cell(cell).is_some_and(|c| !c.transit_only)
    }
}

// ── LayerRegistry ─────────────────────────────────────────────────────────────

/// All custom layers of a world, indexed by layer tag.
///
/// Built once before the world starts; layers are injected at construction
/// and never looked up lazily.
#[derive(Default)]
pub struct LayerRegistry {
    /// `layers[i]` holds the layer with index `i`; slot 0 is always empty.
    layers: Vec<Option<Box<dyn CustomMovementLayer>>>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<L: CustomMovementLayer + 'static>(&mut self, layer: L) -> SpatialResult<()> {
        let index = layer.index();
        if index == 0 {
            return Err(SpatialError::LayerIndexReserved);
        }
        let slot = index as usize;
        if self.layers.len() <= slot {
            self.layers.resize_with(slot + 1, || None);
        }
        if self.layers[slot].is_some() {
            return Err(SpatialError::DuplicateLayer(index));
        }
        self.layers[slot] = Some(Box::new(layer));
        Ok(())
    }

    #[inline]
    pub fn get(&self, index: u8) -> Option<&dyn CustomMovementLayer> {
        self.layers.get(index as usize).and_then(|l| l.as_deref())
    }

    /// Registered layers in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn CustomMovementLayer> {
        self.layers.iter().filter_map(|l| l.as_deref())
    }

    pub fn len(&self) -> usize {
        self.layers.iter().filter(|l| l.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
