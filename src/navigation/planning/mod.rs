//! Local planning inside the on-screen window.
//!
//! This module provides:
//! - Bounded A* from the agent's cell to a target cell
//! - Tile-pair collision rules consulted on every edge

mod astar;
pub mod collision;

pub use astar::{GridPlanner, Plan, PlanStatus, PlanningWindow};
pub use collision::{OneWayPassage, TileCollisionRules, TilesetRules};
