//! A simulated tile world implementing [`Emulator`].
//!
//! Maps are rectangles of tiles with walls, per-tile background ids and warp
//! tiles leading to other maps. NPCs wander one tile at a time at random,
//! driven by a seeded RNG so runs are reproducible.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::navigation::coords::{Direction, LocalCoord, MapId, MapOffsetTable, ScreenCell};
use crate::navigation::emulator::{Emulator, FineTileGrid, WalkabilityGrid};
use crate::navigation::params::{
    CENTER_COL, CENTER_ROW, FINE_COLS, FINE_ROWS, FINE_TILES_PER_CELL, WINDOW_COLS, WINDOW_ROWS,
};

/// One rectangular map.
#[derive(Debug, Clone)]
pub struct GridMap {
    pub width: i32,
    pub height: i32,
    /// Placement on the global grid (before padding).
    pub origin: (i32, i32),
    pub tileset: u8,
    walls: HashSet<(i32, i32)>,
    tiles: HashMap<(i32, i32), u8>,
    warps: HashMap<(i32, i32), LocalCoord>,
}

impl GridMap {
    /// An open map with no walls.
    #[must_use]
    pub fn open(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            origin: (0, 0),
            tileset: 0,
            walls: HashSet::new(),
            tiles: HashMap::new(),
            warps: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    #[must_use]
    pub fn with_tileset(mut self, tileset: u8) -> Self {
        self.tileset = tileset;
        self
    }

    #[must_use]
    pub fn with_wall(mut self, x: i32, y: i32) -> Self {
        self.walls.insert((x, y));
        self
    }

    /// Walls every tile of the inclusive rectangle `(x0, y0)..=(x1, y1)`.
    #[must_use]
    pub fn with_wall_rect(mut self, x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.walls.insert((x, y));
            }
        }
        self
    }

    /// Sets the background tile id drawn on `(x, y)`.
    #[must_use]
    pub fn with_tile(mut self, x: i32, y: i32, tile: u8) -> Self {
        self.tiles.insert((x, y), tile);
        self
    }

    /// Stepping on `(x, y)` moves the agent to `destination`.
    #[must_use]
    pub fn with_warp(mut self, x: i32, y: i32, destination: LocalCoord) -> Self {
        self.warps.insert((x, y), destination);
        self
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        (0..self.width).contains(&x) && (0..self.height).contains(&y)
    }

    #[must_use]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.contains(x, y) && !self.walls.contains(&(x, y))
    }

    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> u8 {
        self.tiles.get(&(x, y)).copied().unwrap_or(0)
    }
}

/// A multi-map world with one agent.
#[derive(Debug, Clone)]
pub struct GridWorld {
    maps: BTreeMap<MapId, GridMap>,
    agent: LocalCoord,
    npcs: Vec<LocalCoord>,
    dialog: Option<String>,
    position_available: bool,
    npc_move_chance: f64,
    rng: SmallRng,
    actions: Vec<Direction>,
}

impl GridWorld {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            maps: BTreeMap::new(),
            agent: LocalCoord::new(0, 0, 0),
            npcs: Vec::new(),
            dialog: None,
            position_available: true,
            npc_move_chance: 0.0,
            rng: SmallRng::seed_from_u64(seed),
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_map(mut self, map_id: MapId, map: GridMap) -> Self {
        self.maps.insert(map_id, map);
        self
    }

    #[must_use]
    pub fn with_agent(mut self, agent: LocalCoord) -> Self {
        self.agent = agent;
        self
    }

    #[must_use]
    pub fn with_npc(mut self, npc: LocalCoord) -> Self {
        self.npcs.push(npc);
        self
    }

    /// Probability that each NPC tries a random step after every agent action.
    #[must_use]
    pub fn with_npc_move_chance(mut self, chance: f64) -> Self {
        self.npc_move_chance = chance.clamp(0.0, 1.0);
        self
    }

    /// Offset table placing every map at its origin.
    #[must_use]
    pub fn offset_table(&self) -> MapOffsetTable {
        self.maps.iter().fold(MapOffsetTable::new(), |table, (&id, map)| {
            table.with_map(id, map.origin.0, map.origin.1, map.width, map.height)
        })
    }

    #[must_use]
    pub fn agent(&self) -> LocalCoord {
        self.agent
    }

    pub fn set_agent(&mut self, agent: LocalCoord) {
        self.agent = agent;
    }

    #[must_use]
    pub fn npcs(&self) -> &[LocalCoord] {
        &self.npcs
    }

    pub fn set_npcs(&mut self, npcs: Vec<LocalCoord>) {
        self.npcs = npcs;
    }

    pub fn set_dialog(&mut self, text: Option<&str>) {
        self.dialog = text.map(str::to_string);
    }

    /// Makes `position()` report the sentinel while `false`.
    pub fn set_position_available(&mut self, available: bool) {
        self.position_available = available;
    }

    /// Every action the world has received, in order.
    #[must_use]
    pub fn actions(&self) -> &[Direction] {
        &self.actions
    }

    fn map(&self) -> Option<&GridMap> {
        self.maps.get(&self.agent.map_id)
    }

    fn npc_at(&self, x: i32, y: i32, map_id: MapId) -> bool {
        self.npcs.iter().any(|npc| npc.x == x && npc.y == y && npc.map_id == map_id)
    }

    /// Local tile shown in window `(row, col)`.
    fn window_tile(&self, row: usize, col: usize) -> (i32, i32) {
        (
            self.agent.x + col as i32 - CENTER_COL as i32,
            self.agent.y + row as i32 - CENTER_ROW as i32,
        )
    }

    fn wander_npcs(&mut self) {
        if self.npc_move_chance <= 0.0 {
            return;
        }
        for i in 0..self.npcs.len() {
            if !self.rng.random_bool(self.npc_move_chance) {
                continue;
            }
            let dir = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            let (dy, dx) = dir.delta();
            let npc = self.npcs[i];
            let (x, y) = (npc.x + dx, npc.y + dy);
            let free = self.maps.get(&npc.map_id).is_some_and(|map| map.is_walkable(x, y))
                && !self.npc_at(x, y, npc.map_id)
                && !(self.agent.map_id == npc.map_id && self.agent.x == x && self.agent.y == y);
            if free {
                self.npcs[i] = LocalCoord::new(x, y, npc.map_id);
            }
        }
    }
}

impl Emulator for GridWorld {
    fn position(&self) -> LocalCoord {
        if self.position_available {
            self.agent
        } else {
            LocalCoord::unavailable(self.agent.map_id)
        }
    }

    fn terrain_window(&self) -> WalkabilityGrid {
        let mut grid = [[false; WINDOW_COLS]; WINDOW_ROWS];
        if let Some(map) = self.map() {
            for (row, cells) in grid.iter_mut().enumerate() {
                for (col, cell) in cells.iter_mut().enumerate() {
                    let (x, y) = self.window_tile(row, col);
                    *cell = map.is_walkable(x, y);
                }
            }
        }
        grid
    }

    fn sprite_cells(&self) -> HashSet<ScreenCell> {
        self.npcs
            .iter()
            .filter(|npc| npc.map_id == self.agent.map_id)
            .filter_map(|npc| {
                ScreenCell::new(
                    CENTER_ROW as i32 + npc.y - self.agent.y,
                    CENTER_COL as i32 + npc.x - self.agent.x,
                )
            })
            .collect()
    }

    fn tileset_id(&self) -> u8 {
        self.map().map_or(0, |map| map.tileset)
    }

    fn fine_tiles(&self) -> Option<FineTileGrid> {
        let map = self.map()?;
        let mut fine = [[0u8; FINE_COLS]; FINE_ROWS];
        for (fine_row, tiles) in fine.iter_mut().enumerate() {
            for (fine_col, tile) in tiles.iter_mut().enumerate() {
                let (x, y) = self.window_tile(fine_row / FINE_TILES_PER_CELL, fine_col / FINE_TILES_PER_CELL);
                *tile = map.tile(x, y);
            }
        }
        Some(fine)
    }

    fn dialog_text(&self) -> Option<String> {
        self.dialog.clone()
    }

    fn emit_action(&mut self, direction: Direction) {
        self.actions.push(direction);
        if self.dialog_active() {
            return;
        }
        let (dy, dx) = direction.delta();
        let (x, y) = (self.agent.x + dx, self.agent.y + dy);
        let map_id = self.agent.map_id;
        let walkable = self.map().is_some_and(|map| map.is_walkable(x, y));
        if walkable && !self.npc_at(x, y, map_id) {
            self.agent = LocalCoord::new(x, y, map_id);
            if let Some(&destination) = self.map().and_then(|map| map.warps.get(&(x, y))) {
                tracing::debug!(from = map_id, to = destination.map_id, "warped");
                self.agent = destination;
            }
        }
        self.wander_npcs();
    }
}
