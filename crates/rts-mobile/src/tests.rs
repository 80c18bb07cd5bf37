//! Unit tests for rts-mobile.

#[cfg(test)]
mod helpers {
    use rts_actor::{ActorStoreBuilder, Crushable, PlayerTable};
    use rts_core::{ActorId, CPos, CrushClasses, DamageTypes, LocomotorId, SimRng, SubCell, Tick, WAngle};
    use rts_locomotion::{LocomotorInfo, LocomotorSet};
    use rts_spatial::{Grid, GridLayer, LayerRegistry, MapBuilder};

    use crate::{MobileEngine, MobileInfo, MobileInit, MovementEvent};

    pub const INFANTRY: CrushClasses = CrushClasses::from_bits(0b1);
    pub const CRUSH:    DamageTypes  = DamageTypes::from_bits(0b1);

    pub const TRACKED: LocomotorId = LocomotorId(0);
    pub const FOOT:    LocomotorId = LocomotorId(1);

    pub const TANK:       ActorId = ActorId(0);
    pub const RED_RIFLE:  ActorId = ActorId(1);
    pub const BLUE_RIFLE: ActorId = ActorId(2);
    pub const TRUCK:      ActorId = ActorId(3);
    /// Blue crushable riflemen used to fill sub-cells.
    pub const SQUAD: [ActorId; 5] = [ActorId(4), ActorId(5), ActorId(6), ActorId(7), ActorId(8)];
    /// Blue rifleman that always runs from a crush warning.
    pub const SKITTISH: ActorId = ActorId(9);
    pub const DIGGER:   ActorId = ActorId(10);
    pub const WALL:     ActorId = ActorId(11);

    pub const OPEN: [&str; 10] = [
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
        "..........",
    ];

    /// One-cell corridor along row 1 with a two-cell pocket below x = 4.
    pub const CORRIDOR: [&str; 4] = ["#########", ".........", "####.####", "####.####"];

    /// Engine over `rows` (`.` clear, `#` rock) with a subterranean layer
    /// (layer 1) under (2,2), which has a portal, and (3,2), which has none.
    pub fn engine_on(rows: &[&str], seed: u64) -> MobileEngine {
        let map = MapBuilder::from_rows(rows, &[('.', "clear"), ('#', "rock")])
            .unwrap()
            .build();
        let clear = map.terrain_index("clear").unwrap();
        let mut layers = LayerRegistry::new();
        layers
            .register(
                GridLayer::subterranean(1)
                    .with_cell(2, 2, clear, -512)
                    .with_cell(3, 2, clear, -512)
                    .with_portal(2, 2),
            )
            .unwrap();
        let grid = Grid::new(map, layers);

        let infos = vec![
            LocomotorInfo::new("tracked")
                .terrain("clear", 100)
                .crushes(INFANTRY)
                .crush_damage_types(CRUSH)
                .wait(2, 0),
            LocomotorInfo::new("foot").shares_cell(true).terrain("clear", 100).wait(2, 0),
        ];
        let locomotors = LocomotorSet::from_infos(infos, grid.map.terrain_types()).unwrap();

        let mut players = PlayerTable::new();
        let red = players.add("red", Some(0));
        let blue = players.add("blue", Some(1));
        let neutral = players.add_neutral("neutral");
        let rifle = || Crushable::new(INFANTRY).warn_probability(0);

        let mut b = ActorStoreBuilder::new(players);
        b.actor("tank", red).unwrap();
        b.crushable_actor("rifle", red, rifle()).unwrap();
        b.crushable_actor("rifle", blue, rifle()).unwrap();
        b.actor("truck", blue).unwrap();
        for _ in SQUAD {
            b.crushable_actor("rifle", blue, rifle()).unwrap();
        }
        b.crushable_actor("rifle", blue, Crushable::new(INFANTRY).warn_probability(100))
            .unwrap();
        b.actor("digger", red).unwrap();
        b.actor("wall", neutral).unwrap();

        MobileEngine::new(grid, locomotors, b.build(), SimRng::new(seed))
    }

    pub fn open(seed: u64) -> MobileEngine {
        engine_on(&OPEN, seed)
    }

    /// Facing south, turning in a single tick.
    pub fn vehicle() -> MobileInfo {
        MobileInfo::new(TRACKED).facing(WAngle::SOUTH).turn_speed(1024)
    }

    pub fn infantry() -> MobileInfo {
        MobileInfo::new(FOOT).facing(WAngle::SOUTH).turn_speed(1024)
    }

    pub fn place(engine: &mut MobileEngine, actor: ActorId, info: MobileInfo, x: i32, y: i32) {
        engine
            .spawn(actor, info, MobileInit::Cell(CPos::new(x, y), SubCell::Any))
            .unwrap();
    }

    /// Run `n` ticks, checking the occupancy index after each one.
    pub fn run(engine: &mut MobileEngine, n: u64) {
        for _ in 0..n {
            step(engine);
        }
    }

    pub fn step(engine: &mut MobileEngine) {
        let now = Tick(engine.now().0 + 1);
        engine.tick(now).unwrap();
        engine.verify().unwrap();
    }

    pub fn cells_of(engine: &MobileEngine, actor: ActorId) -> Vec<CPos> {
        engine.actor_map().registered_cells(actor).iter().map(|&(c, _)| c).collect()
    }

    pub fn finished(events: &[MovementEvent], actor: ActorId) -> Vec<CPos> {
        events
            .iter()
            .filter_map(|e| match *e {
                MovementEvent::FinishedMoving { actor: a, cell } if a == actor => Some(cell),
                _ => None,
            })
            .collect()
    }
}

// ── State projection ──────────────────────────────────────────────────────────

#[cfg(test)]
mod projection {
    use rts_core::{CPos, MovementType, SubCell};
    use rts_locomotion::{Motion, MotionView};
    use rts_spatial::OccupySpace;

    use super::helpers::*;
    use crate::{MobileError, MobileInit, MobileStatus};

    #[test]
    fn spawned_actor_occupies_its_cell() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 5, 5);
        let m = e.mobile(TANK).unwrap();
        assert!(m.is_in_world());
        assert!(m.is_idle());
        assert_eq!(m.top_left(), CPos::new(5, 5));
        assert_eq!(m.to_sub_cell(), SubCell::FullCell);
        assert_eq!(m.occupied_cells().as_slice(), &[(CPos::new(5, 5), SubCell::FullCell)]);
        assert_eq!(m.center_position(), e.grid().center_of_cell(CPos::new(5, 5)));
        e.verify().unwrap();
    }

    #[test]
    fn sharing_locomotor_keeps_a_valid_sub_cell() {
        let mut e = open(1);
        e.spawn(RED_RIFLE, infantry(), MobileInit::Cell(CPos::new(1, 1), SubCell::Index(2)))
            .unwrap();
        e.spawn(BLUE_RIFLE, infantry(), MobileInit::Cell(CPos::new(2, 2), SubCell::Index(9)))
            .unwrap();
        assert_eq!(e.mobile(RED_RIFLE).unwrap().to_sub_cell(), SubCell::Index(2));
        assert_eq!(e.mobile(BLUE_RIFLE).unwrap().to_sub_cell(), e.grid().map.default_sub_cell());
    }

    #[test]
    fn non_sharing_locomotor_always_takes_the_full_cell() {
        let mut e = open(1);
        e.spawn(TANK, vehicle(), MobileInit::Cell(CPos::new(1, 1), SubCell::Index(2)))
            .unwrap();
        assert_eq!(e.mobile(TANK).unwrap().to_sub_cell(), SubCell::FullCell);
    }

    #[test]
    fn spawn_from_world_position_picks_nearest_sub_cell() {
        let mut e = open(1);
        let pos = e.grid().center_of_sub_cell(CPos::new(4, 4), SubCell::Index(1));
        e.spawn(RED_RIFLE, infantry(), MobileInit::Position(pos)).unwrap();
        let m = e.mobile(RED_RIFLE).unwrap();
        assert_eq!(m.to_cell(), CPos::new(4, 4));
        assert_eq!(m.to_sub_cell(), SubCell::Index(1));
    }

    #[test]
    fn spawn_errors() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 1, 1);
        assert!(matches!(
            e.spawn(TANK, vehicle(), MobileInit::Cell(CPos::new(2, 2), SubCell::Any)),
            Err(MobileError::AlreadyMobile(_))
        ));
        assert!(matches!(
            e.spawn(TRUCK, vehicle(), MobileInit::Cell(CPos::new(40, 2), SubCell::Any)),
            Err(MobileError::OffGrid { .. })
        ));
        let mut lost = vehicle();
        lost.locomotor = rts_core::LocomotorId(7);
        assert!(matches!(
            e.spawn(TRUCK, lost, MobileInit::Cell(CPos::new(2, 2), SubCell::Any)),
            Err(MobileError::UnknownLocomotor(_))
        ));
        assert!(matches!(e.move_to(RED_RIFLE, CPos::new(3, 3), 0, false), Err(MobileError::NoMobile(_))));
    }

    #[test]
    fn disabled_actor_occupies_nothing() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 5, 5);
        e.set_status(TANK, MobileStatus::Disabled).unwrap();
        assert!(e.mobile(TANK).unwrap().occupied_cells().is_empty());
        assert!(cells_of(&e, TANK).is_empty());
        e.verify().unwrap();

        e.set_status(TANK, MobileStatus::Enabled).unwrap();
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 5)]);
        e.verify().unwrap();
    }

    #[test]
    fn removed_actor_occupies_nothing_until_added_back() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 5, 5);
        e.remove_from_world(TANK).unwrap();
        assert!(cells_of(&e, TANK).is_empty());
        assert!(!e.mobile(TANK).unwrap().is_in_world());
        e.verify().unwrap();
        e.add_to_world(TANK).unwrap();
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 5)]);
    }

    #[test]
    fn store_reports_motion() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 5, 5);
        place(&mut e, TRUCK, vehicle().immovable(true), 1, 1);
        assert_eq!(
            e.mobiles().motion(TANK),
            Some(Motion { is_moving: false, nudgeable: true })
        );
        assert_eq!(e.mobiles().motion(TRUCK).map(|m| m.nudgeable), Some(false));
        assert_eq!(e.mobiles().motion(BLUE_RIFLE), None);

        e.move_to(TANK, CPos::new(5, 8), 0, false).unwrap();
        run(&mut e, 1);
        assert_eq!(e.mobiles().motion(TANK).map(|m| m.is_moving), Some(true));
        assert_eq!(
            e.mobile(TANK).unwrap().current_movement_types(),
            MovementType::HORIZONTAL
        );
    }

    #[test]
    fn teardown_empties_the_index() {
        let mut e = open(1);
        place(&mut e, TANK, vehicle(), 5, 5);
        e.add_static(WALL, CPos::new(2, 2), SubCell::Any).unwrap();
        e.teardown();
        assert_eq!(e.actor_map().occupied_cell_count(), 0);
        assert!(e.static_occupant(WALL).is_none());
        assert!(!e.mobile(TANK).unwrap().is_in_world());
        e.verify().unwrap();
    }
}

// ── Stepping ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stepping {
    use rts_core::{CPos, MovementType, SubCell, WAngle};

    use super::helpers::*;
    use crate::{MobileStatus, MovementEvent};

    #[test]
    fn straight_move_occupies_each_cell_in_turn() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle(), 5, 5);
        assert!(e.move_to(TANK, CPos::new(5, 7), 0, false).unwrap());

        // Half a cell per tick: the midpoint of each step is reached after
        // one tick and the center after two.
        run(&mut e, 1);
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 6)]);
        run(&mut e, 1);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(5, 6));
        assert_eq!(m.center, e.grid().center_of_cell(CPos::new(5, 6)));

        run(&mut e, 2);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(5, 7));
        assert!(m.is_idle());
        assert!(e.actor_map().actors_at(CPos::new(5, 5)).next().is_none());
        assert!(e.actor_map().actors_at(CPos::new(5, 6)).next().is_none());

        let events = e.take_events();
        assert_eq!(finished(&events, TANK), vec![CPos::new(5, 6), CPos::new(5, 7)]);

        run(&mut e, 1);
        assert_eq!(
            e.take_events(),
            vec![MovementEvent::MovementTypeChanged { actor: TANK, types: MovementType::NONE }]
        );
    }

    #[test]
    fn actor_holds_both_cells_while_leaving() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle().speed(256), 5, 5);
        e.move_to(TANK, CPos::new(5, 6), 0, false).unwrap();

        run(&mut e, 1);
        let m = e.mobile(TANK).unwrap();
        assert!(m.is_leaving_cell());
        assert!(!m.is_idle());
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 5), CPos::new(5, 6)]);

        run(&mut e, 1);
        assert!(!e.mobile(TANK).unwrap().is_leaving_cell());
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 6)]);
    }

    #[test]
    fn turning_takes_ticks_before_the_step() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle().turn_speed(128), 5, 5);
        e.move_to(TANK, CPos::new(6, 5), 0, false).unwrap();

        run(&mut e, 1);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(5, 5));
        assert_eq!(m.current_movement_types(), MovementType::TURN);
        assert_eq!(m.facing(), WAngle::new(384));

        run(&mut e, 1);
        assert_eq!(e.mobile(TANK).unwrap().facing(), WAngle::EAST);
        run(&mut e, 1);
        assert_eq!(e.mobile(TANK).unwrap().current_movement_types(), MovementType::HORIZONTAL);
        run(&mut e, 2);
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(6, 5));
    }

    #[test]
    fn no_path_leaves_the_actor_in_place() {
        let rows = [
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
            "##########",
            "..........",
        ];
        let mut e = engine_on(&rows, 3);
        place(&mut e, TANK, vehicle(), 5, 5);
        e.move_to(TANK, CPos::new(5, 7), 0, false).unwrap();
        for _ in 0..6 {
            run(&mut e, 1);
            assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 5)]);
        }
        assert!(e.mobile(TANK).unwrap().is_idle());
        assert!(e.take_events().is_empty());
    }

    #[test]
    fn sharing_actors_split_a_cell() {
        let mut e = open(3);
        e.spawn(RED_RIFLE, infantry(), crate::MobileInit::Cell(CPos::new(3, 3), SubCell::Any))
            .unwrap();
        place(&mut e, BLUE_RIFLE, infantry(), 3, 5);
        e.move_to(BLUE_RIFLE, CPos::new(3, 3), 0, false).unwrap();
        run(&mut e, 12);

        let red = e.mobile(RED_RIFLE).unwrap();
        let blue = e.mobile(BLUE_RIFLE).unwrap();
        assert_eq!(blue.to_cell(), CPos::new(3, 3));
        assert!(blue.is_idle());
        assert_ne!(red.to_sub_cell(), blue.to_sub_cell());
        assert_eq!(e.actor_map().actors_at(CPos::new(3, 3)).count(), 2);
    }

    #[test]
    fn full_cell_cannot_be_entered() {
        let mut e = open(3);
        for (i, &rifle) in SQUAD.iter().enumerate() {
            e.spawn(rifle, infantry(), crate::MobileInit::Cell(CPos::new(5, 5), SubCell::Index(i as u8 + 1)))
                .unwrap();
        }
        place(&mut e, RED_RIFLE, infantry(), 5, 4);

        let target = CPos::new(5, 5);
        {
            let loco = e.locomotor_of(RED_RIFLE).unwrap();
            let ctx = e.ctx();
            assert_eq!(
                loco.available_sub_cell(
                    &ctx,
                    Some(RED_RIFLE),
                    target,
                    SubCell::Any,
                    None,
                    rts_locomotion::BlockingMode::All,
                ),
                SubCell::Invalid
            );
        }

        e.move_to(RED_RIFLE, target, 0, false).unwrap();
        run(&mut e, 8);
        assert_eq!(e.mobile(RED_RIFLE).unwrap().to_cell(), CPos::new(5, 4));
        assert_eq!(
            e.actor_map().registered_cells(SQUAD[4]),
            &[(target, SubCell::Index(5))]
        );
    }

    #[test]
    fn cancel_mid_step_stops_at_the_next_center() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle().speed(256), 5, 5);
        e.move_to(TANK, CPos::new(5, 8), 0, false).unwrap();
        run(&mut e, 1);
        assert!(e.mobile(TANK).unwrap().is_leaving_cell());

        e.cancel(TANK).unwrap();
        assert!(e.mobile(TANK).unwrap().current_activity().is_some_and(|a| a.is_cancelled()));
        run(&mut e, 3);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(5, 6));
        assert!(m.is_idle());
        assert_eq!(m.center, e.grid().center_of_cell(CPos::new(5, 6)));

        run(&mut e, 4);
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(5, 6));
    }

    #[test]
    fn queued_moves_run_in_order() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle(), 5, 5);
        e.move_to(TANK, CPos::new(5, 6), 0, false).unwrap();
        e.move_to(TANK, CPos::new(6, 6), 0, true).unwrap();
        assert_eq!(e.mobile(TANK).unwrap().queued_activities(), 2);
        run(&mut e, 10);
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(6, 6));
        assert_eq!(finished(&e.take_events(), TANK), vec![CPos::new(5, 6), CPos::new(6, 6)]);
    }

    #[test]
    fn paused_actor_keeps_its_cells_and_ignores_orders() {
        let mut e = open(3);
        place(&mut e, TANK, vehicle().speed(256), 5, 5);
        e.move_to(TANK, CPos::new(5, 6), 0, false).unwrap();
        run(&mut e, 1);
        let center = e.mobile(TANK).unwrap().center;

        e.set_status(TANK, MobileStatus::Paused).unwrap();
        run(&mut e, 3);
        assert_eq!(e.mobile(TANK).unwrap().center, center);
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(5, 5), CPos::new(5, 6)]);
        assert!(!e.move_to(TANK, CPos::new(1, 1), 0, false).unwrap());

        e.set_status(TANK, MobileStatus::Enabled).unwrap();
        run(&mut e, 3);
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(5, 6));
        assert!(e.mobile(TANK).unwrap().is_idle());
    }

    #[test]
    fn unreachable_target_is_replaced_by_a_nearby_cell() {
        let rows = [".....", ".....", "..#..", ".....", "....."];
        let mut e = engine_on(&rows, 3);
        place(&mut e, TANK, vehicle(), 2, 0);
        e.move_to(TANK, CPos::new(2, 2), 0, false).unwrap();
        run(&mut e, 10);
        let m = e.mobile(TANK).unwrap();
        assert!(m.is_idle());
        assert_eq!(m.to_cell(), CPos::new(2, 1));
    }
}

// ── Teleports and layers ──────────────────────────────────────────────────────

#[cfg(test)]
mod layers {
    use rts_core::{CPos, MovementType, SubCell, WPos};

    use super::helpers::*;
    use crate::{EventKind, MobileError, MobileInit, MovementEvent};

    fn dig(e: &mut crate::MobileEngine, x: i32, y: i32) {
        e.spawn(DIGGER, vehicle(), MobileInit::Cell(CPos::with_layer(x, y, 1), SubCell::Any))
            .unwrap();
    }

    #[test]
    fn idle_actor_surfaces_through_a_portal() {
        let mut e = open(5);
        dig(&mut e, 2, 2);
        assert_eq!(e.mobile(DIGGER).unwrap().center.z, -512);

        run(&mut e, 1);
        let m = e.mobile(DIGGER).unwrap();
        assert_eq!(m.queued_activities(), 1);
        assert_eq!(m.current_activity().map(|a| a.target()), Some(CPos::new(2, 2)));
        e.take_events();

        run(&mut e, 1);
        let m = e.mobile(DIGGER).unwrap();
        assert_eq!(m.to_cell(), CPos::new(2, 2));
        assert!(m.is_idle());
        assert_eq!(m.center.z, 0);
        assert_eq!(cells_of(&e, DIGGER), vec![CPos::new(2, 2)]);

        // The layer change is visible; the crossing step raises no
        // FinishedMoving of its own.
        let events = e.take_events();
        assert_eq!(
            events,
            vec![
                MovementEvent::LayerChanged { actor: DIGGER, from_layer: 1, to_layer: 0 },
                MovementEvent::MovementTypeChanged { actor: DIGGER, types: MovementType::VERTICAL },
            ]
        );
    }

    #[test]
    fn no_portal_means_no_way_up() {
        let mut e = open(5);
        dig(&mut e, 3, 2);
        run(&mut e, 10);
        let m = e.mobile(DIGGER).unwrap();
        assert_eq!(m.to_cell(), CPos::with_layer(3, 2, 1));
        assert!(m.is_idle());
    }

    #[test]
    fn occupied_ground_keeps_the_actor_below() {
        let mut e = open(5);
        e.add_static(WALL, CPos::new(2, 2), SubCell::FullCell).unwrap();
        dig(&mut e, 2, 2);
        run(&mut e, 10);
        assert_eq!(e.mobile(DIGGER).unwrap().to_cell(), CPos::with_layer(2, 2, 1));
        assert!(e.take_events().iter().all(|ev| ev.kind() != EventKind::LayerChanged));
    }

    #[test]
    fn teleport_reports_arrival_but_not_a_layer_change() {
        let mut e = open(5);
        place(&mut e, TANK, vehicle(), 1, 1);
        e.set_position(TANK, CPos::new(7, 7), SubCell::Any).unwrap();
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(7, 7));
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(7, 7)]);
        assert_eq!(
            e.take_events(),
            vec![MovementEvent::FinishedMoving { actor: TANK, cell: CPos::new(7, 7) }]
        );

        // The jump itself is not movement.
        run(&mut e, 1);
        assert!(e.take_events().is_empty());
    }

    #[test]
    fn teleport_onto_a_layer_raises_layer_changed() {
        let mut e = open(5);
        place(&mut e, DIGGER, vehicle(), 6, 6);
        e.set_position(DIGGER, CPos::with_layer(3, 2, 1), SubCell::Any).unwrap();
        let below = CPos::with_layer(3, 2, 1);
        assert_eq!(
            e.take_events(),
            vec![
                MovementEvent::LayerChanged { actor: DIGGER, from_layer: 0, to_layer: 1 },
                MovementEvent::FinishedMoving { actor: DIGGER, cell: below },
            ]
        );
        assert_eq!(e.mobile(DIGGER).unwrap().center.z, -512);
    }

    #[test]
    fn world_position_teleport_keeps_the_exact_center() {
        let mut e = open(5);
        place(&mut e, RED_RIFLE, infantry(), 1, 1);
        let pos = e.grid().center_of_sub_cell(CPos::new(4, 6), SubCell::Index(1));
        e.set_position_world(RED_RIFLE, pos).unwrap();
        let m = e.mobile(RED_RIFLE).unwrap();
        assert_eq!(m.to_cell(), CPos::new(4, 6));
        assert_eq!(m.to_sub_cell(), SubCell::Index(1));
        assert_eq!(m.center, pos);

        let off = WPos::new(-4000, 100, 0);
        assert!(matches!(e.set_position_world(RED_RIFLE, off), Err(MobileError::OffGrid { .. })));
        assert_eq!(e.mobile(RED_RIFLE).unwrap().to_cell(), CPos::new(4, 6));
    }

    #[test]
    fn teleport_mid_step_drops_the_directive() {
        let mut e = open(5);
        place(&mut e, TANK, vehicle().speed(256), 5, 5);
        e.move_to(TANK, CPos::new(5, 9), 0, false).unwrap();
        run(&mut e, 1);
        e.set_position(TANK, CPos::new(0, 0), SubCell::Any).unwrap();
        let m = e.mobile(TANK).unwrap();
        assert!(m.is_idle());
        assert_eq!(cells_of(&e, TANK), vec![CPos::new(0, 0)]);
        e.verify().unwrap();
    }
}

// ── Crushing ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod crushing {
    use rts_core::{CPos, SubCell, Tick};

    use super::helpers::*;
    use crate::MovementEvent;

    #[test]
    fn allies_are_not_crushed() {
        let mut e = open(9);
        place(&mut e, TANK, vehicle(), 5, 5);
        place(&mut e, RED_RIFLE, infantry(), 5, 7);
        e.set_position(TANK, CPos::new(5, 7), SubCell::Any).unwrap();
        assert!(e.actors().is_alive(RED_RIFLE));
        assert_eq!(e.actor_map().actors_at(CPos::new(5, 7)).count(), 2);
    }

    #[test]
    fn allies_in_the_way_are_driven_around() {
        let mut e = open(9);
        place(&mut e, TANK, vehicle(), 5, 5);
        place(&mut e, RED_RIFLE, infantry(), 5, 7);
        e.move_to(TANK, CPos::new(5, 8), 0, false).unwrap();
        run(&mut e, 20);
        assert!(e.actors().is_alive(RED_RIFLE));
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(5, 8));
        assert!(!finished(&e.take_events(), TANK).contains(&CPos::new(5, 7)));
    }

    #[test]
    fn enemy_is_crushed_when_the_step_finishes() {
        let mut e = open(9);
        place(&mut e, TANK, vehicle(), 5, 5);
        place(&mut e, BLUE_RIFLE, infantry(), 5, 7);
        e.move_to(TANK, CPos::new(5, 7), 0, false).unwrap();

        run(&mut e, 3);
        assert!(e.actors().is_alive(BLUE_RIFLE));
        assert!(e.take_events().contains(&MovementEvent::CrushWarned {
            victim:  BLUE_RIFLE,
            crusher: TANK,
            fleeing: false,
        }));

        run(&mut e, 1);
        assert!(!e.actors().is_alive(BLUE_RIFLE));
        let death = e.actors().death(BLUE_RIFLE).unwrap();
        assert_eq!(death.killer, TANK);
        assert_eq!(death.damage_types, CRUSH);
        assert_eq!(death.tick, Tick(4));
        assert!(cells_of(&e, BLUE_RIFLE).is_empty());
        assert!(!e.mobile(BLUE_RIFLE).unwrap().is_in_world());

        let events = e.take_events();
        let arrived = events
            .iter()
            .position(|ev| *ev == MovementEvent::FinishedMoving { actor: TANK, cell: CPos::new(5, 7) })
            .unwrap();
        let crushed = events
            .iter()
            .position(|ev| {
                *ev == MovementEvent::Crushed { victim: BLUE_RIFLE, crusher: TANK, damage_types: CRUSH }
            })
            .unwrap();
        assert!(arrived < crushed);
    }

    #[test]
    fn teleport_onto_an_enemy_crushes_it() {
        let mut e = open(9);
        place(&mut e, TANK, vehicle(), 5, 5);
        place(&mut e, BLUE_RIFLE, infantry(), 2, 2);
        e.set_position(TANK, CPos::new(2, 2), SubCell::Any).unwrap();
        assert!(!e.actors().is_alive(BLUE_RIFLE));
        assert_eq!(e.actors().death(BLUE_RIFLE).map(|d| d.killer), Some(TANK));
        e.verify().unwrap();
    }

    #[test]
    fn warned_idle_victim_runs_clear() {
        let mut e = open(9);
        place(&mut e, TANK, vehicle().speed(256), 5, 5);
        place(&mut e, SKITTISH, infantry(), 5, 7);
        e.move_to(TANK, CPos::new(5, 7), 0, false).unwrap();

        run(&mut e, 5);
        assert!(e.take_events().contains(&MovementEvent::CrushWarned {
            victim:  SKITTISH,
            crusher: TANK,
            fleeing: true,
        }));
        assert_eq!(e.mobile(SKITTISH).unwrap().queued_activities(), 1);

        run(&mut e, 5);
        assert!(e.actors().is_alive(SKITTISH));
        assert_eq!(e.mobile(TANK).unwrap().to_cell(), CPos::new(5, 7));
        let fled = e.mobile(SKITTISH).unwrap().to_cell();
        assert_ne!(fled, CPos::new(5, 7));
        assert!(fled.is_adjacent_to(CPos::new(5, 7)));
    }

    #[test]
    fn crush_outcomes_repeat_for_a_seed() {
        let outcome = |seed: u64| {
            let mut e = open(seed);
            place(&mut e, TANK, vehicle().speed(256), 5, 5);
            place(&mut e, SKITTISH, infantry(), 5, 7);
            e.move_to(TANK, CPos::new(5, 8), 0, false).unwrap();
            run(&mut e, 16);
            (e.actors().is_alive(SKITTISH), e.mobile(SKITTISH).unwrap().to_cell(), e.take_events())
        };
        assert_eq!(outcome(21), outcome(21));
    }
}

// ── Blocking and nudges ───────────────────────────────────────────────────────

#[cfg(test)]
mod blocking {
    use rts_core::{ActorId, CPos, SubCell, WAngle};

    use super::helpers::*;
    use crate::MobileStatus;

    /// TANK heads east down the corridor; `blocker` is dropped onto (4,1)
    /// after the path has been searched.
    fn corridor(seed: u64, target: CPos, near_enough: i32, blocker: ActorId) -> crate::MobileEngine {
        let mut e = engine_on(&CORRIDOR, seed);
        place(&mut e, TANK, vehicle().facing(WAngle::EAST), 0, 1);
        place(&mut e, blocker, vehicle(), 4, 3);
        e.move_to(TANK, target, near_enough, false).unwrap();
        run(&mut e, 1);
        e.set_position(blocker, CPos::new(4, 1), SubCell::Any).unwrap();
        e
    }

    #[test]
    fn blocked_mover_nudges_an_allied_blocker_aside() {
        let target = CPos::new(6, 1);
        let mut e = corridor(13, target, 0, DIGGER);
        let mut saw_blocking = false;
        for _ in 0..200 {
            step(&mut e);
            saw_blocking |= e.mobile(TANK).unwrap().is_blocking();
            let m = e.mobile(TANK).unwrap();
            if m.is_idle() && m.to_cell() == target {
                break;
            }
        }
        let m = e.mobile(TANK).unwrap();
        assert!(saw_blocking);
        assert_eq!(m.to_cell(), target);
        assert!(!m.is_blocking());
        assert!(e.actors().is_alive(DIGGER));
        assert_ne!(e.mobile(DIGGER).unwrap().to_cell(), target);
    }

    #[test]
    fn enemy_blocker_holds_its_ground() {
        let mut e = corridor(13, CPos::new(8, 1), 0, TRUCK);
        run(&mut e, 30);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(3, 1));
        assert!(m.is_idle());
        let truck = e.mobile(TRUCK).unwrap();
        assert_eq!(truck.to_cell(), CPos::new(4, 1));
        assert!(truck.is_idle());
    }

    #[test]
    fn blocked_near_enough_counts_as_arrived() {
        let mut e = corridor(13, CPos::new(5, 1), 2, TRUCK);
        e.set_status(TRUCK, MobileStatus::Paused).unwrap();
        run(&mut e, 20);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(3, 1));
        assert!(m.is_idle());
        assert!(!m.is_blocking());
    }

    #[test]
    fn unmovable_blocker_makes_the_mover_give_up() {
        let mut e = corridor(13, CPos::new(8, 1), 0, TRUCK);
        e.set_status(TRUCK, MobileStatus::Paused).unwrap();
        run(&mut e, 30);
        let m = e.mobile(TANK).unwrap();
        assert_eq!(m.to_cell(), CPos::new(3, 1));
        assert!(m.is_idle());
        assert_eq!(e.mobile(TRUCK).unwrap().to_cell(), CPos::new(4, 1));
    }

    #[test]
    fn nudge_moves_an_idle_actor_away_from_the_nudger() {
        let mut e = open(17);
        place(&mut e, TANK, vehicle(), 4, 3);
        place(&mut e, DIGGER, vehicle(), 4, 4);
        assert!(e.nudge(DIGGER, Some(TANK)).unwrap());
        run(&mut e, 6);
        let m = e.mobile(DIGGER).unwrap();
        assert!(m.is_idle());
        assert_ne!(m.to_cell(), CPos::new(4, 4));
        assert_ne!(m.to_cell(), CPos::new(4, 3));
        assert!(m.to_cell().is_adjacent_to(CPos::new(4, 4)));
    }

    #[test]
    fn enemies_cannot_nudge() {
        let mut e = open(17);
        place(&mut e, TANK, vehicle(), 3, 4);
        place(&mut e, TRUCK, vehicle(), 4, 4);
        assert!(!e.nudge(TRUCK, Some(TANK)).unwrap());
        run(&mut e, 6);
        let m = e.mobile(TRUCK).unwrap();
        assert!(m.is_idle());
        assert_eq!(m.to_cell(), CPos::new(4, 4));
    }

    #[test]
    fn scatter_interrupts_a_move() {
        let mut e = open(17);
        place(&mut e, TANK, vehicle().speed(256), 5, 1);
        e.move_to(TANK, CPos::new(5, 9), 0, false).unwrap();
        run(&mut e, 1);
        assert!(!e.nudge(TANK, None).unwrap());

        assert!(e.scatter(TANK).unwrap());
        run(&mut e, 20);
        let m = e.mobile(TANK).unwrap();
        assert!(m.is_idle());
        assert!(m.to_cell().is_adjacent_to(CPos::new(5, 2)));
        assert_ne!(m.to_cell(), CPos::new(5, 2));
    }

    #[test]
    fn nudge_is_a_no_op_when_boxed_in() {
        let mut e = open(17);
        place(&mut e, TRUCK, vehicle(), 0, 0);
        e.add_static(WALL, CPos::new(1, 0), SubCell::FullCell).unwrap();
        place(&mut e, TANK, vehicle().immovable(true), 0, 1);
        e.spawn(DIGGER, vehicle().immovable(true), crate::MobileInit::Cell(CPos::new(1, 1), SubCell::Any))
            .unwrap();
        assert!(!e.nudge(TRUCK, None).unwrap());
        assert!(e.mobile(TRUCK).unwrap().is_idle());
    }

    #[test]
    fn immovable_and_busy_actors_ignore_nudges() {
        let mut e = open(17);
        place(&mut e, TRUCK, vehicle().immovable(true), 4, 4);
        assert!(!e.nudge(TRUCK, None).unwrap());

        place(&mut e, TANK, vehicle(), 6, 6);
        e.move_to(TANK, CPos::new(6, 9), 0, false).unwrap();
        assert!(!e.nudge(TANK, None).unwrap());
    }
}

// ── Observers ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observers {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rts_core::{ActorId, CPos, MovementType};

    use super::helpers::*;
    use crate::{EventKind, MovementObserver};

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl MovementObserver for Recorder {
        fn movement_type_changed(&mut self, actor: ActorId, types: MovementType) {
            self.0.borrow_mut().push(format!("{actor} types {types:?}"));
        }

        fn finished_moving(&mut self, actor: ActorId, cell: CPos) {
            self.0.borrow_mut().push(format!("{actor} at {cell}"));
        }
    }

    #[test]
    fn subscriptions_filter_by_kind_and_actor() {
        let mut e = open(23);
        place(&mut e, TANK, vehicle(), 1, 1);
        place(&mut e, TRUCK, vehicle(), 8, 1);

        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = e.observers.register(Box::new(Recorder(Rc::clone(&log))));
        e.observers.subscribe(handle, EventKind::FinishedMoving, Some(TRUCK));
        assert_eq!(e.observers.len(), 1);

        e.move_to(TANK, CPos::new(1, 2), 0, false).unwrap();
        e.move_to(TRUCK, CPos::new(8, 2), 0, false).unwrap();
        run(&mut e, 4);

        assert_eq!(*log.borrow(), vec![format!("{TRUCK} at {}", CPos::new(8, 2))]);
    }

    #[test]
    fn register_all_sees_every_event_in_order() {
        let mut e = open(23);
        place(&mut e, TANK, vehicle(), 1, 1);
        let log = Rc::new(RefCell::new(Vec::new()));
        e.observers.register_all(Box::new(Recorder(Rc::clone(&log))));

        e.move_to(TANK, CPos::new(1, 2), 0, false).unwrap();
        run(&mut e, 3);

        assert_eq!(
            *log.borrow(),
            vec![
                format!("{TANK} types {:?}", MovementType::HORIZONTAL),
                format!("{TANK} at {}", CPos::new(1, 2)),
                format!("{TANK} types {:?}", MovementType::NONE),
            ]
        );
    }
}
