use std::path::Path;

use serde::Deserialize;

use crate::navigation::error::{NavError, Result};
use crate::navigation::params::{
    DEFAULT_AGENT_WEIGHT, DEFAULT_ARRIVAL_TOLERANCE, DEFAULT_MAX_ADVANCES_PER_TICK,
    DEFAULT_NO_PROGRESS_THRESHOLD, DEFAULT_OSCILLATION_REPEATS, DEFAULT_TARGET_WEIGHT,
};

// =============================================================================
// Navigator Tuning Knobs
// =============================================================================

/// Tunable navigation parameters.
///
/// Every field has a default, so a config file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Local map tiles covered by one window cell along each axis.
    pub tiles_per_cell: i32,
    /// Weight of the agent-to-candidate distance when scoring recorded points.
    pub agent_weight: f64,
    /// Weight of the candidate-to-target distance when scoring recorded points.
    pub target_weight: f64,
    /// Chebyshev distance at which a global target counts as reached.
    pub arrival_tolerance: i32,
    /// Consecutive no-progress replans before a global goal is abandoned.
    pub no_progress_threshold: u32,
    /// Occurrences of the current position in recent history that count as oscillation.
    pub oscillation_repeats: usize,
    /// Follower advances allowed within one tick while goals resolve instantly.
    pub max_advances_per_tick: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            tiles_per_cell: 1,
            agent_weight: DEFAULT_AGENT_WEIGHT,
            target_weight: DEFAULT_TARGET_WEIGHT,
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            no_progress_threshold: DEFAULT_NO_PROGRESS_THRESHOLD,
            oscillation_repeats: DEFAULT_OSCILLATION_REPEATS,
            max_advances_per_tick: DEFAULT_MAX_ADVANCES_PER_TICK,
        }
    }
}

impl NavigatorConfig {
    /// Parses a JSON config, filling unspecified keys with defaults.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(text).map_err(|e| NavError::json(origin, e))?;
        config.tiles_per_cell = config.tiles_per_cell.max(1);
        Ok(config)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| NavError::io(path, e))?;
        Self::from_json(&text, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            NavigatorConfig::from_json(r#"{"no_progress_threshold": 4}"#, Path::new("cfg.json"))
                .unwrap();
        assert_eq!(config.no_progress_threshold, 4);
        assert_eq!(config.tiles_per_cell, 1);
        assert!((config.agent_weight - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_tiles_per_cell_is_at_least_one() {
        let config =
            NavigatorConfig::from_json(r#"{"tiles_per_cell": 0}"#, Path::new("cfg.json")).unwrap();
        assert_eq!(config.tiles_per_cell, 1);
    }

    #[test]
    fn test_malformed_config_names_file() {
        let err = NavigatorConfig::from_json("{", Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
