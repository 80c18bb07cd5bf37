//! The ground-layer terrain map and its builder.
//!
//! # Data layout
//!
//! Terrain and height are dense row-major arrays indexed by
//! `y * width + x`.  Terrain values are [`TerrainIndex`]es into the map's
//! terrain-type name list; locomotors translate names to speeds once at load
//! time, so the per-cell lookup on the cost hot path is a single array read.
//!
//! # Sub-cells
//!
//! A map defines a fixed set of sub-cell offsets (index 0 is the full-cell
//! offset, always `(0, 0, 0)`), plus the default sub-cell used when an actor
//! enters an empty shared cell.

use rts_core::{CELL_SIZE, CPos, SubCell, TerrainIndex, WPos, WVec};

use crate::{SpatialError, SpatialResult};

/// Offset of the five standard sub-positions from the cell center.
const SUB_OFFSET: i32 = CELL_SIZE / 3;

// ── TerrainMap ────────────────────────────────────────────────────────────────

/// Immutable ground-layer terrain.
///
/// Do not construct directly; use [`MapBuilder`].
#[derive(Clone, Debug)]
pub struct TerrainMap {
    width:  i32,
    height: i32,

    /// Terrain-type names, indexed by `TerrainIndex`.
    terrain_types: Vec<String>,

    /// Row-major terrain per cell.
    tiles: Vec<TerrainIndex>,

    /// Row-major ground height (world units) per cell.
    heights: Vec<i32>,

    /// Offsets per sub-cell; `[0]` is `FullCell`.
    sub_cell_offsets: Vec<WVec>,

    default_sub_cell: SubCell,
}

impl TerrainMap {
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// `true` if `(x, y)` lies inside the map, regardless of layer.
    #[inline]
    pub fn contains_xy(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Terrain at a ground cell; `INVALID` outside the map.
    #[inline]
    pub fn terrain_at(&self, x: i32, y: i32) -> TerrainIndex {
        if self.contains_xy(x, y) { self.tiles[self.offset(x, y)] } else { TerrainIndex::INVALID }
    }

    /// Ground height at `(x, y)`; `0` outside the map.
    #[inline]
    pub fn height_at(&self, x: i32, y: i32) -> i32 {
        if self.contains_xy(x, y) { self.heights[self.offset(x, y)] } else { 0 }
    }

    pub fn terrain_types(&self) -> &[String] {
        &self.terrain_types
    }

    pub fn terrain_name(&self, index: TerrainIndex) -> Option<&str> {
        self.terrain_types.get(index.index()).map(String::as_str)
    }

    pub fn terrain_index(&self, name: &str) -> Option<TerrainIndex> {
        self.terrain_types
            .iter()
            .position(|t| t == name)
            .map(|i| TerrainIndex(i as u8))
    }

    /// World position of a ground cell's center, at the cell's height.
    #[inline]
    pub fn center_of_cell(&self, x: i32, y: i32) -> WPos {
        WPos::new(
            CELL_SIZE * x + CELL_SIZE / 2,
            CELL_SIZE * y + CELL_SIZE / 2,
            self.height_at(x, y),
        )
    }

    /// Ground cell containing a world position (floor division).
    #[inline]
    pub fn cell_containing(&self, pos: WPos) -> CPos {
        CPos::new(pos.x.div_euclid(CELL_SIZE), pos.y.div_euclid(CELL_SIZE))
    }

    /// Number of numbered sub-positions (excluding `FullCell`).
    #[inline]
    pub fn sub_cell_count(&self) -> u8 {
        (self.sub_cell_offsets.len() - 1) as u8
    }

    #[inline]
    pub fn default_sub_cell(&self) -> SubCell {
        self.default_sub_cell
    }

    /// Offset of `sub` from its cell center.  `Any`, `Invalid` and unknown
    /// indices resolve to the full-cell offset.
    pub fn offset_of_sub_cell(&self, sub: SubCell) -> WVec {
        match sub {
            SubCell::Index(i) => self
                .sub_cell_offsets
                .get(i as usize)
                .copied()
                .unwrap_or(WVec::ZERO),
            _ => WVec::ZERO,
        }
    }

    /// Sub-position whose offset is nearest to `pos`'s offset within its
    /// cell.  Ties go to the lower index.
    pub fn nearest_sub_cell(&self, pos: WPos) -> SubCell {
        let cell = self.cell_containing(pos);
        let local = pos - self.center_of_cell(cell.x, cell.y);
        (1..self.sub_cell_offsets.len())
            .min_by_key(|&i| {
                let o = self.sub_cell_offsets[i];
                WVec::new(local.x - o.x, local.y - o.y, 0).horizontal_length_squared()
            })
            .map(|i| SubCell::Index(i as u8))
            .unwrap_or(SubCell::FullCell)
    }
}

// ── MapBuilder ────────────────────────────────────────────────────────────────

/// Construct a [`TerrainMap`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use rts_spatial::MapBuilder;
///
/// let map = MapBuilder::from_rows(
///     &["..#", "~..", "..."],
///     &[('.', "clear"), ('#', "rock"), ('~', "water")],
/// )
/// .unwrap()
/// .build();
/// assert_eq!(map.width(), 3);
/// assert_eq!(map.terrain_name(map.terrain_at(2, 0)), Some("rock"));
/// ```
pub struct MapBuilder {
    width:            i32,
    height:           i32,
    terrain_types:    Vec<String>,
    tiles:            Vec<TerrainIndex>,
    heights:          Vec<i32>,
    sub_cell_offsets: Vec<WVec>,
    default_sub_cell: SubCell,
}

impl MapBuilder {
    /// A `width × height` map filled with the first terrain type.
    ///
    /// `terrain_types` must be non-empty and hold at most 255 names.
    pub fn new(width: i32, height: i32, terrain_types: &[&str]) -> SpatialResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(SpatialError::InvalidDimensions { width, height });
        }
        if terrain_types.is_empty() || terrain_types.len() >= TerrainIndex::INVALID.index() {
            return Err(SpatialError::TerrainTypeCount(terrain_types.len()));
        }
        let cells = (width * height) as usize;
        Ok(Self {
            width,
            height,
            terrain_types:    terrain_types.iter().map(|s| s.to_string()).collect(),
            tiles:            vec![TerrainIndex(0); cells],
            heights:          vec![0; cells],
            sub_cell_offsets: standard_sub_cell_offsets(),
            default_sub_cell: SubCell::Index(3),
        })
    }

    /// Build from ASCII rows, one char per cell, using `legend` to map chars
    /// to terrain names.  Terrain types are registered in legend order.
    pub fn from_rows(rows: &[&str], legend: &[(char, &str)]) -> SpatialResult<Self> {
        let height = rows.len() as i32;
        let width = rows.first().map_or(0, |r| r.chars().count()) as i32;
        let names: Vec<&str> = legend.iter().map(|(_, n)| *n).collect();
        let mut b = Self::new(width, height, &names)?;

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() as i32 != width {
                return Err(SpatialError::RaggedRow { row: y, expected: width as usize });
            }
            for (x, ch) in row.chars().enumerate() {
                let idx = legend
                    .iter()
                    .position(|(c, _)| *c == ch)
                    .ok_or_else(|| SpatialError::UnknownTerrain(ch.to_string()))?;
                b.set_terrain(x as i32, y as i32, TerrainIndex(idx as u8))?;
            }
        }
        Ok(b)
    }

    /// Look up a registered terrain name.
    pub fn terrain(&self, name: &str) -> SpatialResult<TerrainIndex> {
        self.terrain_types
            .iter()
            .position(|t| t == name)
            .map(|i| TerrainIndex(i as u8))
            .ok_or_else(|| SpatialError::UnknownTerrain(name.to_owned()))
    }

    fn checked_offset(&self, x: i32, y: i32) -> SpatialResult<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return Err(SpatialError::OutOfBounds(CPos::new(x, y)));
        }
        Ok((y * self.width + x) as usize)
    }

    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: TerrainIndex) -> SpatialResult<&mut Self> {
        if terrain.index() >= self.terrain_types.len() {
            return Err(SpatialError::UnknownTerrain(terrain.to_string()));
        }
        let o = self.checked_offset(x, y)?;
        self.tiles[o] = terrain;
        Ok(self)
    }

    pub fn set_terrain_named(&mut self, x: i32, y: i32, name: &str) -> SpatialResult<&mut Self> {
        let t = self.terrain(name)?;
        self.set_terrain(x, y, t)
    }

    pub fn set_height(&mut self, x: i32, y: i32, height: i32) -> SpatialResult<&mut Self> {
        let o = self.checked_offset(x, y)?;
        self.heights[o] = height;
        Ok(self)
    }

    /// Replace the sub-cell offsets.  `offsets[0]` is forced to zero (the
    /// full-cell offset).
    pub fn sub_cell_offsets(mut self, mut offsets: Vec<WVec>, default: SubCell) -> Self {
        if offsets.is_empty() {
            offsets.push(WVec::ZERO);
        }
        offsets[0] = WVec::ZERO;
        self.sub_cell_offsets = offsets;
        self.default_sub_cell = default;
        self
    }

    pub fn build(self) -> TerrainMap {
        TerrainMap {
            width:            self.width,
            height:           self.height,
            terrain_types:    self.terrain_types,
            tiles:            self.tiles,
            heights:          self.heights,
            sub_cell_offsets: self.sub_cell_offsets,
            default_sub_cell: self.default_sub_cell,
        }
    }
}

/// Full cell plus five sub-positions: the four corners and the center.
fn standard_sub_cell_offsets() -> Vec<WVec> {
    vec![
        WVec::ZERO,
        WVec::new(-SUB_OFFSET, -SUB_OFFSET, 0),
        WVec::new( SUB_OFFSET, -SUB_OFFSET, 0),
        WVec::ZERO,
        WVec::new(-SUB_OFFSET,  SUB_OFFSET, 0),
        WVec::new( SUB_OFFSET,  SUB_OFFSET, 0),
    ]
}
