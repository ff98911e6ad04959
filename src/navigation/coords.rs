//! Coordinate systems and the transforms between them.
//!
//! Three systems are in play:
//! - *local*: emulator-native tile position relative to the current map,
//! - *global*: world-wide tile position, stable across map transitions,
//! - *screen*: a cell of the fixed 9x10 window floating around the agent.
//!
//! Screen cells are only meaningful relative to the agent position they were
//! computed from; every conversion must be redone after the agent moves.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::navigation::error::{NavError, Result};
use crate::navigation::params::{
    CELL_PIXELS, CENTER_COL, CENTER_ROW, GLOBAL_PAD, WINDOW_COLS, WINDOW_ROWS,
};

pub type MapId = u32;

/// World-wide tile position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlobalCoord {
    pub x: i32,
    pub y: i32,
}

impl GlobalCoord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Builds a coordinate from a recorded `[y, x]` pair.
    #[must_use]
    pub const fn from_yx(pair: [i32; 2]) -> Self {
        Self {
            x: pair[1],
            y: pair[0],
        }
    }

    #[must_use]
    pub const fn manhattan(self, other: Self) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[must_use]
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl fmt::Display for GlobalCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x={}, y={})", self.x, self.y)
    }
}

/// Emulator-native tile position. `(-1, -1)` is the "position unavailable" sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalCoord {
    pub x: i32,
    pub y: i32,
    pub map_id: MapId,
}

impl LocalCoord {
    pub const SENTINEL_XY: i32 = -1;

    #[must_use]
    pub const fn new(x: i32, y: i32, map_id: MapId) -> Self {
        Self { x, y, map_id }
    }

    /// A sentinel reading on the given map.
    #[must_use]
    pub const fn unavailable(map_id: MapId) -> Self {
        Self::new(Self::SENTINEL_XY, Self::SENTINEL_XY, map_id)
    }

    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.x == Self::SENTINEL_XY && self.y == Self::SENTINEL_XY
    }

    /// Returns the coordinate unless it is the sentinel.
    #[must_use]
    pub const fn known(self) -> Option<Self> {
        if self.is_sentinel() {
            None
        } else {
            Some(self)
        }
    }
}

/// One of the four movement directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Neighbor expansion order used by the planner.
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Up,
        Direction::Right,
        Direction::Left,
    ];

    /// `(row, col)` offset of one step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(other.to_string()),
        }
    }
}

/// A cell of the on-screen window. Always within bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenCell {
    row: usize,
    col: usize,
}

impl ScreenCell {
    /// The agent's own cell.
    pub const CENTER: ScreenCell = ScreenCell {
        row: CENTER_ROW,
        col: CENTER_COL,
    };

    /// Returns `None` when `(row, col)` lies outside the window.
    #[must_use]
    pub fn new(row: i32, col: i32) -> Option<Self> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < WINDOW_ROWS && col < WINDOW_COLS).then_some(Self { row, col })
    }

    /// Like [`ScreenCell::new`] but reports the rejected cell.
    pub fn try_new(row: i32, col: i32) -> Result<Self> {
        Self::new(row, col).ok_or(NavError::CellOutOfWindow {
            row,
            col,
            rows: WINDOW_ROWS,
            cols: WINDOW_COLS,
        })
    }

    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    /// The adjacent cell in `dir`, if it is still inside the window.
    #[must_use]
    pub fn step(self, dir: Direction) -> Option<Self> {
        let (dr, dc) = dir.delta();
        Self::new(self.row as i32 + dr, self.col as i32 + dc)
    }

    #[must_use]
    pub const fn manhattan(self, other: Self) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Projects a sprite's pixel box onto the window, clamping to its edges.
    #[must_use]
    pub fn from_sprite_pixels(x: i32, y: i32, width: i32, height: i32) -> Self {
        let center_x = x + width / 2;
        let center_y = y + height / 2;
        let col = (center_x / CELL_PIXELS).clamp(0, WINDOW_COLS as i32 - 1);
        let row = (center_y / CELL_PIXELS).clamp(0, WINDOW_ROWS as i32 - 1);
        Self {
            row: row as usize,
            col: col as usize,
        }
    }
}

impl fmt::Display for ScreenCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Placement of one map on the global grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapRegion {
    pub name: String,
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRegionId {
    Number(MapId),
    Text(String),
}

#[derive(Deserialize)]
struct RawRegion {
    id: RawRegionId,
    #[serde(default)]
    name: String,
    coordinates: [i32; 2],
    #[serde(rename = "tileSize", default)]
    tile_size: [i32; 2],
}

#[derive(Deserialize)]
struct RawMapData {
    regions: Vec<RawRegion>,
}

/// Per-map offsets onto the global grid.
#[derive(Clone, Debug, Default)]
pub struct MapOffsetTable {
    regions: HashMap<MapId, MapRegion>,
}

impl MapOffsetTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a map placement.
    pub fn insert(&mut self, map_id: MapId, region: MapRegion) {
        self.regions.insert(map_id, region);
    }

    /// Builder-style registration of an unnamed map.
    #[must_use]
    pub fn with_map(mut self, map_id: MapId, origin_x: i32, origin_y: i32, width: i32, height: i32) -> Self {
        self.insert(
            map_id,
            MapRegion {
                name: format!("MAP_{map_id}"),
                origin_x,
                origin_y,
                width,
                height,
            },
        );
        self
    }

    /// Parses a `{"regions": [...]}` map data document.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let raw: RawMapData = serde_json::from_str(text).map_err(|e| NavError::json(origin, e))?;
        let mut table = Self::new();
        for region in raw.regions {
            let map_id = match region.id {
                RawRegionId::Number(id) => id,
                RawRegionId::Text(text) => {
                    text.trim().parse().map_err(|_| NavError::BadRegionId {
                        path: origin.to_path_buf(),
                        id: text.clone(),
                    })?
                }
            };
            table.insert(
                map_id,
                MapRegion {
                    name: region.name,
                    origin_x: region.coordinates[0],
                    origin_y: region.coordinates[1],
                    width: region.tile_size[0],
                    height: region.tile_size[1],
                },
            );
        }
        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
        let table = Self::from_json(&text, path)?;
        tracing::info!(maps = table.len(), path = %path.display(), "loaded map offsets");
        Ok(table)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[must_use]
    pub fn region(&self, map_id: MapId) -> Option<&MapRegion> {
        self.regions.get(&map_id)
    }

    /// Local to global. `None` for the sentinel or an unknown map.
    #[must_use]
    pub fn local_to_global(&self, local: LocalCoord) -> Option<GlobalCoord> {
        let local = local.known()?;
        let region = self.regions.get(&local.map_id)?;
        Some(GlobalCoord::new(
            local.x + region.origin_x + GLOBAL_PAD,
            local.y + region.origin_y + GLOBAL_PAD,
        ))
    }

    /// Global to local on `map_id`. `None` when the map has no offset entry.
    #[must_use]
    pub fn global_to_local(&self, global: GlobalCoord, map_id: MapId) -> Option<LocalCoord> {
        let region = self.regions.get(&map_id)?;
        Some(LocalCoord::new(
            global.x - region.origin_x - GLOBAL_PAD,
            global.y - region.origin_y - GLOBAL_PAD,
            map_id,
        ))
    }

    /// True when `local` lies inside its map's recorded tile size.
    #[must_use]
    pub fn contains_local(&self, local: LocalCoord) -> bool {
        let Some(region) = self.regions.get(&local.map_id) else {
            return false;
        };
        (0..region.width).contains(&local.x) && (0..region.height).contains(&local.y)
    }
}

/// Conversions between the window and the world for one agent position.
///
/// Holds no state of its own; it only borrows the offset table.
#[derive(Clone, Copy, Debug)]
pub struct Transform<'a> {
    offsets: &'a MapOffsetTable,
    tiles_per_cell: i32,
}

impl<'a> Transform<'a> {
    #[must_use]
    pub fn new(offsets: &'a MapOffsetTable, tiles_per_cell: i32) -> Self {
        Self {
            offsets,
            tiles_per_cell: tiles_per_cell.max(1),
        }
    }

    #[must_use]
    pub fn local_to_global(&self, local: LocalCoord) -> Option<GlobalCoord> {
        self.offsets.local_to_global(local)
    }

    #[must_use]
    pub fn global_to_local(&self, global: GlobalCoord, map_id: MapId) -> Option<LocalCoord> {
        self.offsets.global_to_local(global, map_id)
    }

    /// The global coordinate shown in `cell` while the agent stands at `agent`.
    #[must_use]
    pub fn screen_to_global(&self, cell: ScreenCell, agent: LocalCoord) -> Option<GlobalCoord> {
        let agent = agent.known()?;
        let d_row = cell.row() as i32 - CENTER_ROW as i32;
        let d_col = cell.col() as i32 - CENTER_COL as i32;
        let local = LocalCoord::new(
            agent.x + d_col * self.tiles_per_cell,
            agent.y + d_row * self.tiles_per_cell,
            agent.map_id,
        );
        self.offsets.local_to_global(local)
    }

    /// The window cell showing `global`, or `None` when it is off-screen.
    #[must_use]
    pub fn global_to_screen(&self, global: GlobalCoord, agent: LocalCoord) -> Option<ScreenCell> {
        let agent = agent.known()?;
        let local = self.offsets.global_to_local(global, agent.map_id)?;
        let row_offset = round_half_away(local.y - agent.y, self.tiles_per_cell);
        let col_offset = round_half_away(local.x - agent.x, self.tiles_per_cell);
        ScreenCell::new(CENTER_ROW as i32 + row_offset, CENTER_COL as i32 + col_offset)
    }
}

/// `numerator / denominator` rounded half away from zero.
fn round_half_away(numerator: i32, denominator: i32) -> i32 {
    (f64::from(numerator) / f64::from(denominator)).round() as i32
}
