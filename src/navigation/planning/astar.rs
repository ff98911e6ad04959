//! Bounded A* over the on-screen window.
//!
//! The search always starts at the agent's cell in the middle of the window
//! and never leaves the window. Moves are 4-directional with unit cost and a
//! Manhattan heuristic, so returned paths are shortest under the obstacle set.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

use crate::navigation::coords::{Direction, ScreenCell};
use crate::navigation::emulator::{FineTileGrid, WalkabilityGrid};
use crate::navigation::params::{FINE_TILES_PER_CELL, WINDOW_COLS, WINDOW_ROWS};
use crate::navigation::planning::collision::TilesetRules;

/// Everything the planner may look at for one search.
#[derive(Clone, Copy, Debug)]
pub struct PlanningWindow<'a> {
    pub walkable: &'a WalkabilityGrid,
    pub npcs: &'a HashSet<ScreenCell>,
    pub fine_tiles: Option<&'a FineTileGrid>,
    pub rules: Option<&'a TilesetRules>,
}

impl PlanningWindow<'_> {
    fn is_walkable(&self, cell: ScreenCell) -> bool {
        self.walkable[cell.row()][cell.col()]
    }

    /// A cell the agent could end its walk on.
    fn is_standable(&self, cell: ScreenCell) -> bool {
        self.is_walkable(cell) && !self.npcs.contains(&cell)
    }

    fn fine_tile(tiles: &FineTileGrid, cell: ScreenCell) -> u8 {
        // Bottom-left 8px tile of the cell's 2x2 block.
        tiles[cell.row() * FINE_TILES_PER_CELL + 1][cell.col() * FINE_TILES_PER_CELL]
    }

    fn can_enter(&self, from: ScreenCell, to: ScreenCell, dir: Direction, target: ScreenCell) -> bool {
        if self.npcs.contains(&to) {
            return false;
        }
        if !self.is_walkable(to) && to != target {
            return false;
        }
        match (self.fine_tiles, self.rules) {
            (Some(tiles), Some(rules)) => {
                rules.allows(Self::fine_tile(tiles, from), Self::fine_tile(tiles, to), dir)
            }
            _ => true,
        }
    }
}

/// How a plan relates to the requested target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanStatus {
    /// The path ends on the target.
    Reached,
    /// The target cannot be stood on; the path ends next to it.
    AdjacentToTarget,
    /// The target is unreachable; the path ends at the closest reachable cell.
    ClosestReachable,
}

/// Result of one planner search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub status: PlanStatus,
    pub target: ScreenCell,
    /// Cell the agent stands on after executing `actions`.
    pub destination: ScreenCell,
    pub actions: Vec<Direction>,
}

impl Plan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps = self.actions.len();
        match self.status {
            PlanStatus::Reached => {
                write!(f, "Success: path to target {} ({steps} steps)", self.target)
            }
            PlanStatus::AdjacentToTarget => write!(
                f,
                "Success: target {} is blocked; path to adjacent cell {} ({steps} steps)",
                self.target, self.destination
            ),
            PlanStatus::ClosestReachable => write!(
                f,
                "Partial: target {} unreachable; routed to closest reachable cell {} ({steps} steps)",
                self.target, self.destination
            ),
        }
    }
}

/// Open-set entry. Lower `f` first, then earlier insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenNode {
    f: usize,
    seq: u64,
    cell: ScreenCell,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert both keys.
        other.f.cmp(&self.f).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type CellMap<T> = [[T; WINDOW_COLS]; WINDOW_ROWS];

/// Window A* planner.
#[derive(Clone, Debug, Default)]
pub struct GridPlanner {
    last_expanded: usize,
}

impl GridPlanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes expanded by the last search.
    #[must_use]
    pub const fn last_expanded(&self) -> usize {
        self.last_expanded
    }

    /// Plans from the window center to `target`.
    pub fn plan(&mut self, window: &PlanningWindow<'_>, target: ScreenCell) -> Plan {
        let start = ScreenCell::CENTER;
        let target_standable = window.is_standable(target);

        let mut g_score: CellMap<Option<usize>> = [[None; WINDOW_COLS]; WINDOW_ROWS];
        let mut came_from: CellMap<Option<(ScreenCell, Direction)>> =
            [[None; WINDOW_COLS]; WINDOW_ROWS];
        let mut closed: CellMap<bool> = [[false; WINDOW_COLS]; WINDOW_ROWS];
        let mut open = BinaryHeap::new();
        let mut seq = 0u64;

        g_score[start.row()][start.col()] = Some(0);
        open.push(OpenNode {
            f: start.manhattan(target),
            seq,
            cell: start,
        });

        let mut closest = start;
        let mut closest_distance = start.manhattan(target);
        self.last_expanded = 0;

        while let Some(OpenNode { cell, .. }) = open.pop() {
            if closed[cell.row()][cell.col()] {
                continue;
            }
            closed[cell.row()][cell.col()] = true;
            self.last_expanded += 1;

            if cell == target && target_standable {
                return Self::finish(PlanStatus::Reached, target, cell, &came_from);
            }
            if !target_standable && cell.manhattan(target) == 1 {
                return Self::finish(PlanStatus::AdjacentToTarget, target, cell, &came_from);
            }

            let distance = cell.manhattan(target);
            if distance < closest_distance {
                closest = cell;
                closest_distance = distance;
            }
            if cell == target {
                continue;
            }

            let Some(g) = g_score[cell.row()][cell.col()] else {
                continue;
            };
            for dir in Direction::ALL {
                let Some(next) = cell.step(dir) else {
                    continue;
                };
                if closed[next.row()][next.col()] || !window.can_enter(cell, next, dir, target) {
                    continue;
                }
                let tentative = g + 1;
                let slot = &mut g_score[next.row()][next.col()];
                if slot.map_or(true, |known| tentative < known) {
                    *slot = Some(tentative);
                    came_from[next.row()][next.col()] = Some((cell, dir));
                    seq += 1;
                    open.push(OpenNode {
                        f: tentative + next.manhattan(target),
                        seq,
                        cell: next,
                    });
                }
            }
        }

        tracing::debug!(%target, %closest, "target unreachable inside window");
        Self::finish(PlanStatus::ClosestReachable, target, closest, &came_from)
    }

    fn finish(
        status: PlanStatus,
        target: ScreenCell,
        destination: ScreenCell,
        came_from: &CellMap<Option<(ScreenCell, Direction)>>,
    ) -> Plan {
        let mut actions = Vec::new();
        let mut cursor = destination;
        while let Some((previous, dir)) = came_from[cursor.row()][cursor.col()] {
            actions.push(dir);
            cursor = previous;
        }
        actions.reverse();
        Plan {
            status,
            target,
            destination,
            actions,
        }
    }
}
