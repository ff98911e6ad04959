//! Recorded traversal data: quest paths and warp paths.
//!
//! Both are maps from map id to an ordered list of global coordinates,
//! stored on disk as JSON objects of `"map_id": [[y, x], ...]`. Quest paths
//! come one file per quest (`NNN/NNN_coords.json`), warp paths in one
//! combined file. The store is built once and never mutated afterwards.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::navigation::coords::{GlobalCoord, MapId};
use crate::navigation::error::{NavError, Result};

pub type QuestId = u32;

/// Recorded points of one file, keyed by map id in ascending order.
pub type MapPaths = BTreeMap<MapId, Vec<GlobalCoord>>;

/// Read-only index of every recorded quest and warp path.
#[derive(Clone, Debug, Default)]
pub struct RecordedPathStore {
    quests: BTreeMap<QuestId, MapPaths>,
    warps: MapPaths,
}

impl RecordedPathStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quest path segment. Empty segments are ignored.
    #[must_use]
    pub fn with_quest_path(mut self, quest: QuestId, map: MapId, points: Vec<GlobalCoord>) -> Self {
        if !points.is_empty() {
            self.quests.entry(quest).or_default().insert(map, points);
        }
        self
    }

    /// Adds a warp corridor for `map`. Empty segments are ignored.
    #[must_use]
    pub fn with_warp_path(mut self, map: MapId, points: Vec<GlobalCoord>) -> Self {
        if !points.is_empty() {
            self.warps.insert(map, points);
        }
        self
    }

    /// Parses one path document (`{"map_id": [[y, x], ...]}`).
    pub fn parse_path_file(text: &str, origin: &Path) -> Result<MapPaths> {
        let raw: HashMap<String, Vec<[i32; 2]>> =
            serde_json::from_str(text).map_err(|e| NavError::json(origin, e))?;
        let mut paths = MapPaths::new();
        for (key, pairs) in raw {
            let map_id: MapId = key.trim().parse().map_err(|_| NavError::BadMapKey {
                path: origin.to_path_buf(),
                key: key.clone(),
            })?;
            if pairs.is_empty() {
                continue;
            }
            paths.insert(map_id, pairs.into_iter().map(GlobalCoord::from_yx).collect());
        }
        Ok(paths)
    }

    fn read_path_file(path: &Path) -> Result<MapPaths> {
        let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
        Self::parse_path_file(&text, path)
    }

    /// Finds `NNN/NNN_coords.json` files under `dir`, sorted by quest id.
    fn quest_files(dir: &Path) -> Result<Vec<(QuestId, PathBuf)>> {
        let entries = std::fs::read_dir(dir).map_err(|e| NavError::io(dir, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| NavError::io(dir, e))?;
            let quest_dir = entry.path();
            if !quest_dir.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let file = quest_dir.join(format!("{name}_coords.json"));
            if !file.exists() {
                tracing::debug!(dir = %quest_dir.display(), "no coords file, skipping");
                continue;
            }
            let quest: QuestId = name.parse().map_err(|_| NavError::BadQuestDir {
                path: quest_dir.clone(),
                name: name.clone(),
            })?;
            files.push((quest, file));
        }
        files.sort_by_key(|(quest, _)| *quest);
        Ok(files)
    }

    /// Loads every quest file under `dir`. Any malformed file aborts the load.
    pub fn load_quest_dir(dir: &Path) -> Result<BTreeMap<QuestId, MapPaths>> {
        let files = Self::quest_files(dir)?;
        let parsed = files
            .par_iter()
            .map(|(quest, file)| Self::read_path_file(file).map(|paths| (*quest, paths)))
            .collect::<Result<Vec<_>>>()?;
        Ok(parsed.into_iter().collect())
    }

    /// Builds the store from a quest directory and a warp file, either optional.
    pub fn load(quest_dir: Option<&Path>, warp_file: Option<&Path>) -> Result<Self> {
        let quests = match quest_dir {
            Some(dir) => Self::load_quest_dir(dir)?,
            None => BTreeMap::new(),
        };
        let warps = match warp_file {
            Some(file) => Self::read_path_file(file)?,
            None => MapPaths::new(),
        };
        let store = Self { quests, warps };
        tracing::info!(
            quests = store.quests.len(),
            quest_points = store.quests.values().flat_map(BTreeMap::values).map(Vec::len).sum::<usize>(),
            warp_maps = store.warps.len(),
            "loaded recorded paths"
        );
        Ok(store)
    }

    #[must_use]
    pub fn quest_ids(&self) -> Vec<QuestId> {
        self.quests.keys().copied().collect()
    }

    #[must_use]
    pub fn has_quest(&self, quest: QuestId) -> bool {
        self.quests.contains_key(&quest)
    }

    #[must_use]
    pub fn quest_path(&self, quest: QuestId, map: MapId) -> Option<&[GlobalCoord]> {
        self.quests.get(&quest)?.get(&map).map(Vec::as_slice)
    }

    #[must_use]
    pub fn warp_path(&self, map: MapId) -> Option<&[GlobalCoord]> {
        self.warps.get(&map).map(Vec::as_slice)
    }

    /// Maps touched by `quest`, ascending.
    #[must_use]
    pub fn quest_maps(&self, quest: QuestId) -> Vec<MapId> {
        self.quests
            .get(&quest)
            .map(|paths| paths.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The quest's next map after `map` in ascending map-id order.
    #[must_use]
    pub fn next_quest_map(&self, quest: QuestId, map: MapId) -> Option<(MapId, &[GlobalCoord])> {
        self.quests
            .get(&quest)?
            .range((Bound::Excluded(map), Bound::Unbounded))
            .next()
            .map(|(id, points)| (*id, points.as_slice()))
    }

    /// Every recorded segment on `map`: quest segments in quest order, then the warp corridor.
    #[must_use]
    pub fn segments_for_map(&self, map: MapId) -> Vec<&[GlobalCoord]> {
        self.quests
            .values()
            .filter_map(|paths| paths.get(&map).map(Vec::as_slice))
            .chain(self.warp_path(map))
            .collect()
    }

    /// Every recorded point on `map`, in the order of [`Self::segments_for_map`].
    pub fn points_on_map(&self, map: MapId) -> impl Iterator<Item = GlobalCoord> + '_ {
        self.segments_for_map(map).into_iter().flatten().copied()
    }
}
