//! Unit tests for rts-spatial.
//!
//! All tests use small hand-written maps.

#[cfg(test)]
mod helpers {
    use smallvec::smallvec;

    use rts_core::{CPos, SubCell, WPos};

    use crate::{Grid, GridLayer, LayerRegistry, MapBuilder, OccupiedCells, OccupySpace};

    /// 5×5 map: clear everywhere except a rock at (2,2).
    pub fn small_map() -> MapBuilder {
        MapBuilder::from_rows(
            &[".....", ".....", "..#..", ".....", "....."],
            &[('.', "clear"), ('#', "rock")],
        )
        .unwrap()
    }

    /// `small_map` plus a bridge (layer 1) over row 1 with portals at both
    /// ends, and a tunnel (layer 2) whose middle cell is transit-only.
    pub fn layered_grid() -> Grid {
        let map = small_map().build();
        let clear = map.terrain_index("clear").unwrap();
        let mut layers = LayerRegistry::new();
        layers
            .register(
                GridLayer::elevated_bridge(1)
                    .with_cell(1, 1, clear, 256)
                    .with_cell(2, 1, clear, 256)
                    .with_cell(3, 1, clear, 256)
                    .with_portal(1, 1)
                    .with_portal(3, 1)
                    .transition_costs(50, 25),
            )
            .unwrap();
        layers
            .register(
                GridLayer::tunnel(2)
                    .with_cell(0, 3, clear, -512)
                    .with_cell(1, 3, clear, -512)
                    .with_transit_only(1, 3)
                    .with_portal(0, 3)
                    .enabled_for(["wheeled"]),
            )
            .unwrap();
        Grid::new(map, layers)
    }

    /// A fixed projection for driving the occupancy index directly.
    pub struct Occupant {
        pub cells: Vec<(CPos, SubCell)>,
        pub pos:   WPos,
    }

    impl Occupant {
        pub fn at(cell: CPos, sub: SubCell) -> Self {
            Self { cells: vec![(cell, sub)], pos: WPos::ZERO }
        }

        pub fn spanning(from: CPos, to: CPos) -> Self {
            Self {
                cells: vec![(from, SubCell::FullCell), (to, SubCell::FullCell)],
                pos:   WPos::ZERO,
            }
        }
    }

    impl OccupySpace for Occupant {
        fn occupied_cells(&self) -> OccupiedCells {
            let mut out: OccupiedCells = smallvec![];
            out.extend(self.cells.iter().copied());
            out
        }

        fn center_position(&self) -> WPos {
            self.pos
        }
    }
}

// ── TerrainMap ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod map {
    use rts_core::{CPos, SubCell, TerrainIndex, WPos};

    use super::helpers::small_map;
    use crate::{MapBuilder, SpatialError};

    #[test]
    fn rows_are_parsed() {
        let map = small_map().build();
        assert_eq!((map.width(), map.height()), (5, 5));
        assert_eq!(map.terrain_name(map.terrain_at(2, 2)), Some("rock"));
        assert_eq!(map.terrain_name(map.terrain_at(0, 0)), Some("clear"));
        assert_eq!(map.terrain_at(-1, 0), TerrainIndex::INVALID);
        assert_eq!(map.terrain_at(5, 0), TerrainIndex::INVALID);
    }

    #[test]
    fn ragged_rows_error() {
        let r = MapBuilder::from_rows(&["...", ".."], &[('.', "clear")]);
        assert!(matches!(r, Err(SpatialError::RaggedRow { row: 1, .. })));
    }

    #[test]
    fn unknown_legend_char_errors() {
        let r = MapBuilder::from_rows(&[".x"], &[('.', "clear")]);
        assert!(matches!(r, Err(SpatialError::UnknownTerrain(_))));
    }

    #[test]
    fn out_of_bounds_setters_error() {
        let mut b = small_map();
        assert!(matches!(b.set_height(9, 9, 1), Err(SpatialError::OutOfBounds(_))));
        assert!(b.set_terrain_named(0, 0, "lava").is_err());
    }

    #[test]
    fn centers_and_containment() {
        let mut b = small_map();
        b.set_height(1, 2, 128).unwrap();
        let map = b.build();
        assert_eq!(map.center_of_cell(1, 2), WPos::new(1536, 2560, 128));
        assert_eq!(map.cell_containing(WPos::new(1536, 2560, 0)), CPos::new(1, 2));
        assert_eq!(map.cell_containing(WPos::new(-1, 0, 0)), CPos::new(-1, 0));
    }

    #[test]
    fn sub_cells() {
        let map = small_map().build();
        assert_eq!(map.sub_cell_count(), 5);
        assert_eq!(map.default_sub_cell(), SubCell::Index(3));
        assert_eq!(map.offset_of_sub_cell(SubCell::FullCell).length_squared(), 0);
        let c = map.center_of_cell(0, 0);
        let tl = c + map.offset_of_sub_cell(SubCell::Index(1));
        assert_eq!(map.nearest_sub_cell(tl), SubCell::Index(1));
        assert_eq!(map.nearest_sub_cell(c), SubCell::Index(3));
    }
}

// ── Layers & Grid ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod layers {
    use rts_core::{CPos, TerrainIndex, WPos};

    use super::helpers::layered_grid;
    use crate::{CustomMovementLayer, GridLayer, LayerRegistry, SpatialError};

    #[test]
    fn registry_rejects_ground_and_duplicates() {
        let mut reg = LayerRegistry::new();
        assert!(matches!(reg.register(GridLayer::tunnel(0)), Err(SpatialError::LayerIndexReserved)));
        reg.register(GridLayer::tunnel(4)).unwrap();
        assert!(matches!(reg.register(GridLayer::jumpjet(4)), Err(SpatialError::DuplicateLayer(4))));
        assert_eq!(reg.len(), 1);
        assert!(reg.get(3).is_none());
        assert_eq!(reg.get(4).map(|l| l.index()), Some(4));
    }

    #[test]
    fn presets_carry_flags() {
        assert!(GridLayer::elevated_bridge(1).interacts_with_default_layer());
        assert!(!GridLayer::elevated_bridge(1).return_to_ground_layer_on_idle());
        assert!(!GridLayer::tunnel(1).interacts_with_default_layer());
        assert!(GridLayer::subterranean(1).return_to_ground_layer_on_idle());
        assert!(!GridLayer::subterranean(1).interacts_with_default_layer());
        assert!(GridLayer::jumpjet(1).interacts_with_default_layer());
        assert!(GridLayer::jumpjet(1).return_to_ground_layer_on_idle());
    }

    #[test]
    fn grid_contains_per_layer() {
        let g = layered_grid();
        assert!(g.contains(CPos::new(4, 4)));
        assert!(!g.contains(CPos::new(5, 4)));
        assert!(g.contains(CPos::with_layer(2, 1, 1)));
        assert!(!g.contains(CPos::with_layer(2, 2, 1)));
        assert!(!g.contains(CPos::with_layer(0, 0, 9)));
        assert_eq!(g.terrain_index(CPos::with_layer(0, 0, 9)), TerrainIndex::INVALID);
    }

    #[test]
    fn layer_centers_use_layer_height() {
        let g = layered_grid();
        assert_eq!(g.center_of_cell(CPos::with_layer(2, 1, 1)), WPos::new(2560, 1536, 256));
        assert_eq!(g.center_of_cell(CPos::new(2, 1)), WPos::new(2560, 1536, 0));
    }

    #[test]
    fn portals_gate_transitions() {
        let g = layered_grid();
        let bridge = g.layer(1).unwrap();
        assert_eq!(bridge.entry_movement_cost("foot", CPos::with_layer(1, 1, 1)), Some(50));
        assert_eq!(bridge.exit_movement_cost("foot", CPos::with_layer(3, 1, 1)), Some(25));
        assert_eq!(bridge.entry_movement_cost("foot", CPos::with_layer(2, 1, 1)), None);

        let tunnel = g.layer(2).unwrap();
        assert!(tunnel.enabled_for_locomotor("wheeled"));
        assert!(!tunnel.enabled_for_locomotor("foot"));
        assert_eq!(tunnel.entry_movement_cost("foot", CPos::with_layer(0, 3, 2)), None);
        assert_eq!(tunnel.entry_movement_cost("wheeled", CPos::with_layer(0, 3, 2)), Some(0));
    }

    #[test]
    fn ground_level_and_idle_rules() {
        let g = layered_grid();
        assert!(g.is_at_ground_level(CPos::new(0, 0)));
        assert!(g.is_at_ground_level(CPos::with_layer(2, 1, 1)));
        assert!(!g.is_at_ground_level(CPos::with_layer(0, 3, 2)));
        assert!(g.allows_idle(CPos::with_layer(0, 3, 2)));
        assert!(!g.allows_idle(CPos::with_layer(1, 3, 2)));
        assert!(!g.allows_idle(CPos::with_layer(4, 4, 2)));
    }

    #[test]
    fn annulus_is_ordered_and_bounded() {
        let g = layered_grid();
        let cells = g.cells_in_annulus(CPos::new(2, 2), 1, 1);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0], CPos::new(2, 1));
        assert_eq!(cells[3], CPos::new(2, 3));

        let ring2 = g.cells_in_annulus(CPos::new(0, 0), 0, 2);
        assert_eq!(ring2[0], CPos::new(0, 0));
        assert_eq!(ring2.len(), 13);
    }
}

// ── ActorMap ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod actor_map {
    use rts_core::{ActorId, CPos, SubCell, WPos};

    use super::helpers::{layered_grid, Occupant};
    use crate::{ActorMap, SpatialError};

    fn index() -> ActorMap {
        ActorMap::new(&layered_grid())
    }

    #[test]
    fn add_and_query() {
        let mut m = index();
        let c = CPos::new(1, 1);
        m.add_influence(ActorId(3), &Occupant::at(c, SubCell::Index(1)));
        m.add_influence(ActorId(1), &Occupant::at(c, SubCell::Index(2)));

        let all: Vec<_> = m.actors_at(c).collect();
        assert_eq!(all, vec![ActorId(1), ActorId(3)]);
        let s1: Vec<_> = m.actors_at_sub(c, SubCell::Index(1)).collect();
        assert_eq!(s1, vec![ActorId(3)]);
        assert!(m.any_actors_at_sub(c, SubCell::FullCell));
        assert!(!m.any_actors_at(CPos::new(0, 0)));
        assert!(!m.any_actors_at(c.on_layer(1)));
    }

    #[test]
    fn add_is_idempotent_and_moves_registration() {
        let mut m = index();
        let occ = Occupant::at(CPos::new(0, 0), SubCell::FullCell);
        m.add_influence(ActorId(0), &occ);
        m.add_influence(ActorId(0), &occ);
        assert_eq!(m.occupants(CPos::new(0, 0)).len(), 1);

        m.add_influence(ActorId(0), &Occupant::at(CPos::new(4, 4), SubCell::FullCell));
        assert!(!m.any_actors_at(CPos::new(0, 0)));
        assert!(m.any_actors_at(CPos::new(4, 4)));
        assert_eq!(m.occupied_cell_count(), 1);
    }

    #[test]
    fn remove_clears_all_cells() {
        let mut m = index();
        let occ = Occupant::spanning(CPos::new(1, 1), CPos::new(1, 2));
        m.add_influence(ActorId(5), &occ);
        assert_eq!(m.registered_cells(ActorId(5)).len(), 2);
        assert!(m.remove_influence(ActorId(5)));
        assert!(!m.remove_influence(ActorId(5)));
        assert_eq!(m.occupied_cell_count(), 0);
        assert!(m.registered_cells(ActorId(5)).is_empty());
    }

    #[test]
    fn update_rederives_projection() {
        let mut m = index();
        let mut occ = Occupant::spanning(CPos::new(1, 1), CPos::new(1, 2));
        m.add_influence(ActorId(2), &occ);
        occ.cells.truncate(1);
        m.update_occupied_cells(ActorId(2), &occ);
        assert!(m.verify(ActorId(2), &occ).is_ok());
        assert!(!m.any_actors_at(CPos::new(1, 2)));
    }

    #[test]
    fn verify_detects_drift() {
        let mut m = index();
        let mut occ = Occupant::at(CPos::new(0, 0), SubCell::FullCell);
        m.add_influence(ActorId(0), &occ);
        occ.cells[0].0 = CPos::new(0, 1);
        assert!(matches!(m.verify(ActorId(0), &occ), Err(SpatialError::Inconsistent { .. })));
        assert!(m.verify_no_stale_entries().is_ok());
    }

    #[test]
    fn free_sub_cell_prefers_then_defaults_then_scans() {
        let mut m = index();
        let c = CPos::new(3, 3);
        let all = |_: ActorId| true;

        assert_eq!(m.free_sub_cell(c, SubCell::Any, all), SubCell::Index(3));
        assert_eq!(m.free_sub_cell(c, SubCell::Index(5), all), SubCell::Index(5));

        m.add_influence(ActorId(0), &Occupant::at(c, SubCell::Index(3)));
        assert_eq!(m.free_sub_cell(c, SubCell::Index(3), all), SubCell::Index(1));
        assert_eq!(m.free_sub_cell(c, SubCell::Index(4), all), SubCell::Index(4));

        // A filter that ignores actor 0 sees an empty cell.
        assert_eq!(m.free_sub_cell(c, SubCell::Any, |a| a != ActorId(0)), SubCell::Index(3));
    }

    #[test]
    fn full_cell_is_honoured_when_preferred() {
        let mut m = index();
        let c = CPos::new(3, 3);
        let all = |_: ActorId| true;
        assert_eq!(m.free_sub_cell(c, SubCell::FullCell, all), SubCell::FullCell);

        m.add_influence(ActorId(0), &Occupant::at(c, SubCell::Index(3)));
        assert_eq!(m.free_sub_cell(c, SubCell::FullCell, all), SubCell::Index(1));
        assert_eq!(m.free_sub_cell(c, SubCell::FullCell, |a| a != ActorId(0)), SubCell::FullCell);
    }

    #[test]
    fn full_cell_occupant_leaves_no_sub_cell() {
        let mut m = index();
        let c = CPos::new(3, 3);
        m.add_influence(ActorId(0), &Occupant::at(c, SubCell::FullCell));
        assert_eq!(m.free_sub_cell(c, SubCell::Index(2), |_| true), SubCell::Invalid);
        assert!(!m.has_free_sub_cell(c, |_| true));
    }

    #[test]
    fn every_slot_taken_is_invalid() {
        let mut m = index();
        let c = CPos::new(2, 4);
        for i in 1..=5u8 {
            m.add_influence(ActorId(i as u32), &Occupant::at(c, SubCell::Index(i)));
        }
        assert_eq!(m.free_sub_cell(c, SubCell::Any, |_| true), SubCell::Invalid);
        let mine = ActorId(2);
        assert_eq!(m.free_sub_cell(c, SubCell::Any, |a| a != mine), SubCell::Index(2));
    }

    #[test]
    fn positions_apply_on_tick() {
        let mut m = index();
        m.update_position(ActorId(1), WPos::new(100, 100, 0));
        m.update_position(ActorId(0), WPos::new(900, 900, 0));
        assert!(m.actors_in_box(WPos::ZERO, WPos::new(1024, 1024, 0)).is_empty());

        m.tick();
        let inside = m.actors_in_box(WPos::ZERO, WPos::new(1024, 1024, 0));
        assert_eq!(inside, vec![ActorId(0), ActorId(1)]);
        assert_eq!(m.actors_in_circle(WPos::new(100, 100, 0), 10), vec![ActorId(1)]);

        m.update_position(ActorId(1), WPos::new(5000, 5000, 0));
        m.remove_position(ActorId(0));
        m.tick();
        assert!(m.actors_in_box(WPos::ZERO, WPos::new(1024, 1024, 0)).is_empty());
        assert_eq!(m.actors_in_circle(WPos::new(5000, 5000, 0), 1), vec![ActorId(1)]);
    }

    #[test]
    fn teardown_empties_everything() {
        let mut m = index();
        m.add_influence(ActorId(0), &Occupant::at(CPos::new(0, 0), SubCell::FullCell));
        m.update_position(ActorId(0), WPos::ZERO);
        m.tick();
        m.teardown();
        assert_eq!(m.occupied_cell_count(), 0);
        assert!(m.actors_in_circle(WPos::ZERO, 10).is_empty());
    }
}
