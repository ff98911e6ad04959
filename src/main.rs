#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::collapsible_if)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use overworld_nav::navigation::planning::TileCollisionRules;
use overworld_nav::navigation::{
    follow_recorded_path, GlobalCoord, GridMap, GridWorld, LocalCoord, MapOffsetTable, NavWorld,
    NavigationState, Navigator, NavigatorConfig, QuestPathFollower, RecordedPathStore,
};

#[derive(Parser)]
#[command(name = "overworld_nav", about = "Drive the tile-world navigator through a simulated overworld")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk to a global tile coordinate
    Goto(GotoArgs),
    /// Follow a quest's recorded path
    Follow(FollowArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// JSON navigator config; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for NPC wandering
    #[arg(long, default_value = "7")]
    seed: u64,
    /// Map offset file ({"regions": [...]}); defaults to the demo world's layout
    #[arg(long)]
    map_data: Option<PathBuf>,
    /// Tile-pair collision rule file
    #[arg(long)]
    collisions: Option<PathBuf>,
    /// Directory of NNN/NNN_coords.json quest path files
    #[arg(long)]
    quest_dir: Option<PathBuf>,
    /// Combined warp path file
    #[arg(long)]
    warp_file: Option<PathBuf>,
    /// Maximum ticks to run
    #[arg(long, default_value = "200")]
    ticks: usize,
}

#[derive(Args)]
struct GotoArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Global x
    x: i32,
    /// Global y
    y: i32,
}

#[derive(Args)]
struct FollowArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, default_value = "1")]
    quest: u32,
}

const DEMO_QUEST: u32 = 1;

/// Two 20x18 maps side by side, joined by a warp on the east edge of map 0.
fn demo_world(seed: u64) -> GridWorld {
    let town = GridMap::open(20, 18)
        .with_wall_rect(6, 3, 10, 6)
        .with_wall_rect(12, 11, 15, 14)
        .with_warp(19, 9, LocalCoord::new(1, 9, 1));
    let route = GridMap::open(20, 18)
        .with_origin(20, 0)
        .with_wall_rect(8, 0, 8, 7)
        .with_wall_rect(8, 11, 8, 17)
        .with_warp(0, 9, LocalCoord::new(18, 9, 0));
    GridWorld::new(seed)
        .with_map(0, town)
        .with_map(1, route)
        .with_agent(LocalCoord::new(3, 9, 0))
        .with_npc(LocalCoord::new(12, 5, 0))
        .with_npc(LocalCoord::new(14, 9, 1))
        .with_npc_move_chance(0.3)
}

/// Recorded points along the demo world's main road, in global coordinates.
fn demo_paths() -> RecordedPathStore {
    let town: Vec<GlobalCoord> = (5..=37).step_by(4).map(|x| GlobalCoord::new(x, 29)).collect();
    let route: Vec<GlobalCoord> = (42..=58).step_by(4).map(|x| GlobalCoord::new(x, 29)).collect();
    RecordedPathStore::new()
        .with_quest_path(DEMO_QUEST, 0, town)
        .with_quest_path(DEMO_QUEST, 1, route)
        .with_warp_path(0, vec![GlobalCoord::new(39, 29)])
}

fn build(common: &CommonArgs) -> Result<(Navigator, GridWorld)> {
    let config = match &common.config {
        Some(path) => NavigatorConfig::load(path).context("loading navigator config")?,
        None => NavigatorConfig::default(),
    };
    let world = demo_world(common.seed);

    let offsets = match &common.map_data {
        Some(path) => MapOffsetTable::load(path).context("loading map offsets")?,
        None => world.offset_table(),
    };
    let collisions = match &common.collisions {
        Some(path) => TileCollisionRules::load(path).context("loading collision rules")?,
        None => TileCollisionRules::new(),
    };
    let paths = if common.quest_dir.is_some() || common.warp_file.is_some() {
        RecordedPathStore::load(common.quest_dir.as_deref(), common.warp_file.as_deref())
            .context("loading recorded paths")?
    } else {
        demo_paths()
    };

    let nav = Navigator::new(Arc::new(NavWorld::new(offsets, collisions, paths)), config);
    Ok((nav, world))
}

fn run_goto(args: &GotoArgs) -> Result<()> {
    let (mut nav, mut world) = build(&args.common)?;
    nav.set_navigation_goal_global(args.x, args.y);
    for tick in 0..args.common.ticks {
        let report = nav.step(&mut world);
        tracing::info!(tick, state = %nav.navigation_status(), "{report}");
        if nav.navigation_status() == NavigationState::Idle {
            break;
        }
    }
    println!("{}", nav.status_report());
    println!("agent: {:?}, actions: {}", world.agent(), world.actions().len());
    Ok(())
}

fn run_follow(args: &FollowArgs) -> Result<()> {
    let (mut nav, mut world) = build(&args.common)?;
    let mut follower = QuestPathFollower::new(args.quest);
    if let Some(index) = follower.snap_to_nearest(&nav, &world) {
        tracing::info!(index, "resuming quest path");
    }
    let report = follow_recorded_path(&mut nav, &mut follower, &mut world, args.common.ticks);
    println!(
        "stopped after {} ticks ({:?}): {} actions; {}",
        report.ticks,
        report.stop,
        report.actions.len(),
        report.last_message
    );
    println!("agent: {:?}", world.agent());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Goto(args) => run_goto(args),
        Commands::Follow(args) => run_follow(args),
    }
}
