//! Tile-pair collision rules.
//!
//! Some moves are blocked not by the destination tile itself but by the pair
//! of tiles on either side of the edge: ledges, elevation changes, counters.
//! Rules are grouped per tileset and compare the bottom-left fine tile of the
//! two window cells involved.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::navigation::coords::Direction;
use crate::navigation::emulator::Tileset;
use crate::navigation::error::{NavError, Result};

/// A ledge-like passage that can only be crossed from `from` onto `to`
/// while moving in `allowed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OneWayPassage {
    pub from: u8,
    pub to: u8,
    pub allowed: Direction,
}

/// Collision rules of one tileset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TilesetRules {
    impassable: Vec<(u8, u8)>,
    one_way: Vec<OneWayPassage>,
}

impl TilesetRules {
    #[must_use]
    pub fn new(impassable: Vec<(u8, u8)>, one_way: Vec<OneWayPassage>) -> Self {
        Self {
            impassable,
            one_way,
        }
    }

    /// Whether stepping from a cell showing `from_tile` onto one showing
    /// `to_tile` in direction `dir` is allowed.
    #[must_use]
    pub fn allows(&self, from_tile: u8, to_tile: u8, dir: Direction) -> bool {
        let blocked_pair = self.impassable.iter().any(|&(a, b)| {
            (from_tile == a && to_tile == b) || (from_tile == b && to_tile == a)
        });
        if blocked_pair {
            return false;
        }
        self.one_way.iter().all(|passage| {
            if from_tile == passage.to && to_tile == passage.from {
                return false;
            }
            !(from_tile == passage.from && to_tile == passage.to && dir != passage.allowed)
        })
    }
}

#[derive(Deserialize)]
struct RawTilesetRules {
    #[serde(default)]
    impassable_general: Vec<(u8, u8)>,
    #[serde(default)]
    one_way_passages: Vec<(u8, u8, String)>,
}

/// Collision rules for every tileset, keyed by tileset name.
#[derive(Clone, Debug, Default)]
pub struct TileCollisionRules {
    by_tileset: HashMap<String, TilesetRules>,
}

impl TileCollisionRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tileset: impl Into<String>, rules: TilesetRules) {
        self.by_tileset.insert(tileset.into(), rules);
    }

    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let raw: HashMap<String, RawTilesetRules> =
            serde_json::from_str(text).map_err(|e| NavError::json(origin, e))?;
        let mut rules = Self::new();
        for (tileset, entry) in raw {
            let one_way = entry
                .one_way_passages
                .into_iter()
                .map(|(from, to, direction)| {
                    let allowed = direction.parse().map_err(|_| NavError::BadDirection {
                        path: origin.to_path_buf(),
                        tileset: tileset.clone(),
                        direction: direction.clone(),
                    })?;
                    Ok(OneWayPassage { from, to, allowed })
                })
                .collect::<Result<Vec<_>>>()?;
            rules.insert(tileset, TilesetRules::new(entry.impassable_general, one_way));
        }
        Ok(rules)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
        let rules = Self::from_json(&text, path)?;
        tracing::info!(tilesets = rules.len(), path = %path.display(), "loaded tile pair collisions");
        Ok(rules)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tileset.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tileset.is_empty()
    }

    #[must_use]
    pub fn for_tileset(&self, name: &str) -> Option<&TilesetRules> {
        self.by_tileset.get(name)
    }

    /// Rules for the tileset with in-game id `id`; `None` means permissive.
    #[must_use]
    pub fn for_tileset_id(&self, id: u8) -> Option<&TilesetRules> {
        Tileset::from_id(id).and_then(|tileset| self.for_tileset(tileset.name()))
    }
}
