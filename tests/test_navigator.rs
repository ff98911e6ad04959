//! Tests for the navigation state machine.
//!
//! Worlds use a map placed so that global coordinates equal local ones.

use std::collections::HashSet;
use std::sync::Arc;

use overworld_nav::navigation::coords::{Direction, GlobalCoord, LocalCoord, ScreenCell};
use overworld_nav::navigation::emulator::{Emulator, WalkabilityGrid};
use overworld_nav::navigation::params::{WINDOW_COLS, WINDOW_ROWS};
use overworld_nav::navigation::planning::{TileCollisionRules, TilesetRules};
use overworld_nav::navigation::{
    GridMap, GridWorld, MapOffsetTable, NavWorld, NavigationGoal, NavigationState, Navigator,
    NavigatorConfig, RecordedPathStore, StepReport,
};

fn identity_map(width: i32, height: i32) -> GridMap {
    GridMap::open(width, height).with_origin(-20, -20)
}

fn world_with(map: GridMap, agent: (i32, i32)) -> GridWorld {
    GridWorld::new(3)
        .with_map(0, map)
        .with_agent(LocalCoord::new(agent.0, agent.1, 0))
}

fn navigator_for(world: &GridWorld) -> Navigator {
    let nav_world = NavWorld::new(world.offset_table(), TileCollisionRules::new(), RecordedPathStore::new());
    Navigator::new(Arc::new(nav_world), NavigatorConfig::default())
}

/// Steps until the navigator is idle, returning every report.
fn run_until_idle(nav: &mut Navigator, world: &mut GridWorld, max_ticks: usize) -> Vec<StepReport> {
    let mut reports = Vec::new();
    for _ in 0..max_ticks {
        let before = world.actions().len();
        let report = nav.step(world);
        let emitted = world.actions().len() - before;
        assert!(emitted <= 1, "step emitted {emitted} actions");
        assert_eq!(report.action.is_some(), emitted == 1);
        reports.push(report);
        if nav.navigation_status() == NavigationState::Idle {
            break;
        }
    }
    reports
}

#[test]
fn test_walks_three_tiles_right() {
    // Agent at (y=10, x=10), target (y=10, x=13).
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);

    let reports = run_until_idle(&mut nav, &mut world, 10);
    let actions: Vec<Direction> = reports.iter().filter_map(|r| r.action).collect();
    assert_eq!(actions, vec![Direction::Right, Direction::Right, Direction::Right]);
    assert_eq!(world.agent(), LocalCoord::new(13, 10, 0));
    assert!(reports.last().unwrap().message.contains("Reached"));
    assert_eq!(nav.goal(), NavigationGoal::None);
}

#[test]
fn test_first_action_is_emitted_on_the_planning_tick() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);

    let report = nav.step(&mut world);
    assert_eq!(report.action, Some(Direction::Right));
    assert!(report.message.contains("Success"));
    assert_eq!(nav.navigation_status(), NavigationState::Navigating);
    assert_eq!(nav.pending_actions(), 2);
}

#[test]
fn test_goal_within_one_tile_is_already_reached() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(11, 11);

    let report = nav.step(&mut world);
    assert_eq!(report.action, None);
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert!(world.actions().is_empty());
}

#[test]
fn test_off_screen_target_without_recorded_points_fails() {
    let mut world = world_with(identity_map(80, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(60, 10);

    let report = nav.step(&mut world);
    assert_eq!(nav.navigation_status(), NavigationState::Failed);
    assert!(report.message.contains("no on-screen target"), "{}", report.message);
    assert_eq!(report.action, None);

    let report = nav.step(&mut world);
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert!(report.message.contains("no on-screen target"));
    assert!(world.actions().is_empty());
}

#[test]
fn test_off_screen_target_routes_through_recorded_points() {
    let mut world = world_with(identity_map(80, 40), (10, 10));
    let paths = RecordedPathStore::new().with_quest_path(
        1,
        0,
        (12..=60).step_by(3).map(|x| GlobalCoord::new(x, 10)).collect(),
    );
    let nav_world = NavWorld::new(world.offset_table(), TileCollisionRules::new(), paths);
    let mut nav = Navigator::new(Arc::new(nav_world), NavigatorConfig::default());
    nav.set_navigation_goal_global(60, 10);

    let reports = run_until_idle(&mut nav, &mut world, 120);
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert!(reports.last().unwrap().message.contains("Reached"), "{}", nav.status_report());
    assert!(world.agent().x >= 59);
}

#[test]
fn test_dialog_pauses_and_resumes() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);

    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
    assert_eq!(nav.pending_actions(), 2);

    world.set_dialog(Some("PROF.OAK: Wait! Don't go out!"));
    let report = nav.step(&mut world);
    assert_eq!(report.action, None);
    assert!(report.message.contains("paused"));
    assert_eq!(nav.pending_actions(), 0);
    assert_eq!(nav.navigation_status(), NavigationState::Planning);
    assert_eq!(world.actions().len(), 1);

    // Still paused while the dialog stays open.
    assert_eq!(nav.step(&mut world).action, None);

    world.set_dialog(None);
    let reports = run_until_idle(&mut nav, &mut world, 10);
    assert_eq!(reports[0].action, Some(Direction::Right));
    assert_eq!(world.agent(), LocalCoord::new(13, 10, 0));
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
}

#[test]
fn test_blank_dialog_text_does_not_pause() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);
    world.set_dialog(Some("   "));
    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
}

#[test]
fn test_npc_stepping_into_path_triggers_replan() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);

    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
    world.set_npcs(vec![LocalCoord::new(12, 10, 0)]);

    let report = nav.step(&mut world);
    assert_eq!(report.action, None);
    assert!(report.message.contains("blocked"));
    assert_eq!(nav.navigation_status(), NavigationState::Planning);
    assert_eq!(nav.pending_actions(), 0);

    let reports = run_until_idle(&mut nav, &mut world, 20);
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert!(reports.last().unwrap().message.contains("Reached"));
    assert_eq!(world.agent(), LocalCoord::new(13, 10, 0));
}

#[test]
fn test_unavailable_position_skips_the_tick() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);
    world.set_position_available(false);

    let report = nav.step(&mut world);
    assert_eq!(report.action, None);
    assert!(report.message.contains("Position unavailable"));
    assert_eq!(nav.navigation_status(), NavigationState::Planning);
    assert!(nav.state().history.is_empty());
    assert!(nav.state().position_before_plan.is_none());

    world.set_position_available(true);
    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
}

#[test]
fn test_unreachable_cell_recurring_trips_loop_guard() {
    let map = identity_map(40, 40)
        .with_wall(12, 10)
        .with_wall(14, 10)
        .with_wall(13, 9)
        .with_wall(13, 11);
    let mut world = world_with(map, (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);

    let first = nav.step(&mut world);
    assert_eq!(first.action, Some(Direction::Right));
    assert!(first.message.contains("Partial"));

    let second = nav.step(&mut world);
    assert_eq!(second.action, None);
    assert_eq!(nav.navigation_status(), NavigationState::Failed);
    assert!(second.message.contains("planning loop"), "{}", second.message);

    nav.step(&mut world);
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
}

#[test]
fn test_new_goal_discards_pending_actions() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(16, 10);
    nav.step(&mut world);
    assert!(nav.pending_actions() > 0);

    nav.set_navigation_goal_global(11, 14);
    assert_eq!(nav.pending_actions(), 0);
    assert_eq!(nav.navigation_status(), NavigationState::Planning);
    assert_eq!(nav.goal(), NavigationGoal::Global(GlobalCoord::new(11, 14)));
    assert_eq!(nav.step(&mut world).action, Some(Direction::Down));
}

#[test]
fn test_reset_mid_navigation() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(16, 10);
    nav.step(&mut world);
    nav.reset();
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert_eq!(nav.pending_actions(), 0);
    assert_eq!(nav.step(&mut world).action, None);
}

#[test]
fn test_local_goal_is_single_shot() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_local(2, 4).unwrap();

    let reports = run_until_idle(&mut nav, &mut world, 10);
    let actions: Vec<Direction> = reports.iter().filter_map(|r| r.action).collect();
    assert_eq!(actions, vec![Direction::Up, Direction::Up]);
    assert_eq!(world.agent(), LocalCoord::new(10, 8, 0));
    assert!(reports.last().unwrap().message.contains("Local target"));
}

#[test]
fn test_local_goal_keeps_its_tile_across_a_dialog() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_local(2, 4).unwrap();

    assert_eq!(nav.step(&mut world).action, Some(Direction::Up));
    world.set_dialog(Some("A wild PIDGEY appeared!"));
    assert!(nav.step(&mut world).message.contains("paused"));
    assert_eq!(nav.navigation_status(), NavigationState::Planning);
    world.set_dialog(None);

    run_until_idle(&mut nav, &mut world, 10);
    assert_eq!(world.actions(), &[Direction::Up, Direction::Up][..]);
    assert_eq!(world.agent(), LocalCoord::new(10, 8, 0));
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
}

#[test]
fn test_local_goal_keeps_its_tile_after_npc_block() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_local(4, 7).unwrap();

    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
    world.set_npcs(vec![LocalCoord::new(12, 10, 0)]);
    assert!(nav.step(&mut world).message.contains("blocked"));
    world.set_npcs(Vec::new());

    let reports = run_until_idle(&mut nav, &mut world, 10);
    assert_eq!(world.actions(), &[Direction::Right; 3][..]);
    assert_eq!(world.agent(), LocalCoord::new(13, 10, 0));
    assert!(reports.last().unwrap().message.contains("completed"));
}

#[test]
fn test_local_goal_dropped_when_tile_leaves_the_window() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_local(4, 9).unwrap();

    assert_eq!(nav.step(&mut world).action, Some(Direction::Right));
    world.set_dialog(Some("..."));
    nav.step(&mut world);
    // Carried far to the left while the dialog was open.
    world.set_agent(LocalCoord::new(2, 10, 0));
    world.set_dialog(None);

    let report = nav.step(&mut world);
    assert_eq!(report.action, None);
    assert!(report.message.contains("no longer on screen"), "{}", report.message);
    assert_eq!(nav.navigation_status(), NavigationState::Failed);
}

#[test]
fn test_unreachable_local_goal_reports_closest_stop() {
    let map = identity_map(40, 40)
        .with_wall(12, 10)
        .with_wall(14, 10)
        .with_wall(13, 9)
        .with_wall(13, 11);
    let mut world = world_with(map, (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_local(4, 7).unwrap();

    let reports = run_until_idle(&mut nav, &mut world, 10);
    let last = &reports.last().unwrap().message;
    assert!(last.contains("unreachable") && last.contains("closest"), "{last}");
    assert!(!last.contains("completed"));
    assert_ne!(world.agent(), LocalCoord::new(13, 10, 0));
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
}

#[test]
fn test_tile_pair_rules_from_world_data() {
    let map = identity_map(40, 40).with_tile(10, 10, 3).with_tile(11, 10, 4);
    let mut world = world_with(map, (10, 10));
    let mut rules = TileCollisionRules::new();
    rules.insert("OVERWORLD", TilesetRules::new(vec![(3, 4)], Vec::new()));
    let nav_world = NavWorld::new(world.offset_table(), rules, RecordedPathStore::new());
    let mut nav = Navigator::new(Arc::new(nav_world), NavigatorConfig::default());
    nav.set_navigation_goal_global(12, 10);

    let reports = run_until_idle(&mut nav, &mut world, 10);
    assert_ne!(world.actions()[0], Direction::Right);
    assert_eq!(world.actions().len(), 4);
    assert!(reports.last().unwrap().message.contains("Reached"));
}

#[test]
fn test_wandering_npcs_never_cause_double_actions() {
    let map = identity_map(40, 40).with_wall_rect(13, 6, 13, 12);
    let mut world = GridWorld::new(11)
        .with_map(0, map)
        .with_agent(LocalCoord::new(10, 10, 0))
        .with_npc(LocalCoord::new(11, 9, 0))
        .with_npc(LocalCoord::new(12, 11, 0))
        .with_npc(LocalCoord::new(14, 10, 0))
        .with_npc_move_chance(0.5);
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(15, 10);

    let reports = run_until_idle(&mut nav, &mut world, 100);
    assert_eq!(
        reports.iter().filter(|r| r.action.is_some()).count(),
        world.actions().len()
    );
    if nav.navigation_status() != NavigationState::Navigating {
        assert_eq!(nav.pending_actions(), 0);
    }
    for npc in world.npcs() {
        assert!(!(npc.x == 13 && (6..=12).contains(&npc.y)), "npc walked into a wall");
    }
}

// ============== Progress Guard ==============

/// Emulator whose reported position cycles through a fixed script, one entry per action.
struct ScriptedEmulator {
    positions: Vec<LocalCoord>,
    emitted: usize,
}

impl Emulator for ScriptedEmulator {
    fn position(&self) -> LocalCoord {
        self.positions[self.emitted % self.positions.len()]
    }

    fn terrain_window(&self) -> WalkabilityGrid {
        [[true; WINDOW_COLS]; WINDOW_ROWS]
    }

    fn sprite_cells(&self) -> HashSet<ScreenCell> {
        HashSet::new()
    }

    fn tileset_id(&self) -> u8 {
        0
    }

    fn dialog_text(&self) -> Option<String> {
        None
    }

    fn emit_action(&mut self, _direction: Direction) {
        self.emitted += 1;
    }
}

#[test]
fn test_oscillating_positions_abandon_goal() {
    let a = LocalCoord::new(10, 10, 0);
    let b = LocalCoord::new(11, 10, 0);
    let mut emu = ScriptedEmulator {
        positions: vec![a, b],
        emitted: 0,
    };
    let offsets = MapOffsetTable::new().with_map(0, -20, -20, 40, 40);
    let nav_world = NavWorld::new(offsets, TileCollisionRules::new(), RecordedPathStore::new());
    let mut nav = Navigator::new(Arc::new(nav_world), NavigatorConfig::default());
    nav.set_navigation_goal_global(13, 10);

    let mut abandoned = None;
    for tick in 0..40 {
        let before = emu.emitted;
        let report = nav.step(&mut emu);
        assert!(emu.emitted - before <= 1);
        if report.message.contains("abandoned") {
            abandoned = Some(tick);
            break;
        }
    }
    assert!(abandoned.is_some(), "goal never abandoned: {}", nav.status_report());
    assert_eq!(nav.navigation_status(), NavigationState::Idle);
    assert_eq!(nav.goal(), NavigationGoal::None);
}

#[test]
fn test_progress_resets_no_progress_counter() {
    let mut world = world_with(identity_map(40, 40), (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);
    run_until_idle(&mut nav, &mut world, 10);
    assert_eq!(nav.state().no_progress, 0);
}

#[test]
fn test_new_goal_clears_progress_bookkeeping() {
    let mut emu = ScriptedEmulator {
        positions: vec![LocalCoord::new(10, 10, 0), LocalCoord::new(11, 10, 0)],
        emitted: 0,
    };
    let offsets = MapOffsetTable::new().with_map(0, -20, -20, 40, 40);
    let nav_world = NavWorld::new(offsets, TileCollisionRules::new(), RecordedPathStore::new());
    let mut nav = Navigator::new(Arc::new(nav_world), NavigatorConfig::default());
    nav.set_navigation_goal_global(13, 10);

    for _ in 0..40 {
        nav.step(&mut emu);
        if nav.state().no_progress > 0 {
            break;
        }
    }
    assert_eq!(nav.state().no_progress, 1, "{}", nav.status_report());
    assert!(!nav.state().history.is_empty());

    nav.set_navigation_goal_global(10, 14);
    assert!(nav.state().history.is_empty());
    assert_eq!(nav.state().no_progress, 0);
    assert!(nav.state().position_before_plan.is_none());
    assert!(nav.state().last_failed_target.is_none());
}

#[test]
fn test_new_goal_clears_unreachable_marker() {
    let map = identity_map(40, 40)
        .with_wall(12, 10)
        .with_wall(14, 10)
        .with_wall(13, 9)
        .with_wall(13, 11);
    let mut world = world_with(map, (10, 10));
    let mut nav = navigator_for(&world);
    nav.set_navigation_goal_global(13, 10);
    nav.step(&mut world);
    assert!(nav.state().last_failed_target.is_some());

    nav.set_navigation_goal_global(11, 14);
    assert!(nav.state().last_failed_target.is_none());
    assert_eq!(nav.step(&mut world).action, Some(Direction::Down));
}
