//! Error type for loading navigation data and validating goals.
//!
//! Runtime navigation problems (unreachable targets, stalls, missing recorded
//! data) are not errors: they surface as status messages from `step()` and
//! the path follower. Only data loading and caller input can fail.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: map id key `{key}` is not an integer")]
    BadMapKey { path: PathBuf, key: String },

    #[error("{path}: map region id `{id}` is not an integer")]
    BadRegionId { path: PathBuf, id: String },

    #[error("{path}: tileset `{tileset}` has one-way passage with unknown direction `{direction}`")]
    BadDirection {
        path: PathBuf,
        tileset: String,
        direction: String,
    },

    #[error("{path}: quest directory name `{name}` is not a quest id")]
    BadQuestDir { path: PathBuf, name: String },

    #[error("cell ({row}, {col}) is outside the {rows}x{cols} window")]
    CellOutOfWindow {
        row: i32,
        col: i32,
        rows: usize,
        cols: usize,
    },
}

pub type Result<T> = std::result::Result<T, NavError>;

impl NavError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
