//! Intermediate-target selection over recorded points.
//!
//! When the ultimate target is off-screen the navigator aims at a recorded
//! point instead: one that is close to the agent, closer to the target, and
//! ideally visible in the current window.

use crate::navigation::config::NavigatorConfig;
use crate::navigation::coords::{GlobalCoord, LocalCoord, ScreenCell, Transform};
use crate::navigation::recorded::RecordedPathStore;

/// Outcome of scoring the recorded points of the agent's map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Selection {
    /// Best candidate that can seed a local plan right now.
    OnScreen {
        point: GlobalCoord,
        cell: ScreenCell,
        score: f64,
    },
    /// Best candidate overall; none of the candidates is visible.
    OffScreen { point: GlobalCoord, score: f64 },
    /// The map has no recorded points (or the agent position is unknown).
    NoCandidates,
}

impl Selection {
    /// The window cell to plan toward, if the selection is usable locally.
    #[must_use]
    pub const fn on_screen_cell(&self) -> Option<ScreenCell> {
        match self {
            Self::OnScreen { cell, .. } => Some(*cell),
            Self::OffScreen { .. } | Self::NoCandidates => None,
        }
    }
}

/// Weighted-distance scorer for recorded points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntermediateTargetSelector {
    agent_weight: f64,
    target_weight: f64,
}

impl Default for IntermediateTargetSelector {
    fn default() -> Self {
        Self::from_config(&NavigatorConfig::default())
    }
}

impl IntermediateTargetSelector {
    #[must_use]
    pub const fn new(agent_weight: f64, target_weight: f64) -> Self {
        Self {
            agent_weight,
            target_weight,
        }
    }

    #[must_use]
    pub const fn from_config(config: &NavigatorConfig) -> Self {
        Self::new(config.agent_weight, config.target_weight)
    }

    /// Lower is better.
    #[must_use]
    pub fn score(&self, agent: GlobalCoord, candidate: GlobalCoord, target: GlobalCoord) -> f64 {
        self.agent_weight * f64::from(agent.manhattan(candidate))
            + self.target_weight * f64::from(candidate.manhattan(target))
    }

    /// Scores every recorded point on the agent's map against `target`.
    ///
    /// The agent's own tile is skipped. Among equal scores the first point in
    /// store order wins.
    #[must_use]
    pub fn select(
        &self,
        store: &RecordedPathStore,
        transform: &Transform<'_>,
        agent: LocalCoord,
        target: GlobalCoord,
    ) -> Selection {
        let Some(agent_global) = transform.local_to_global(agent) else {
            return Selection::NoCandidates;
        };

        let mut best_visible: Option<(GlobalCoord, ScreenCell, f64)> = None;
        let mut best_any: Option<(GlobalCoord, f64)> = None;

        for point in store.points_on_map(agent.map_id) {
            if point == agent_global {
                continue;
            }
            let score = self.score(agent_global, point, target);
            if best_any.map_or(true, |(_, best)| score < best) {
                best_any = Some((point, score));
            }
            if let Some(cell) = transform.global_to_screen(point, agent) {
                if best_visible.map_or(true, |(_, _, best)| score < best) {
                    best_visible = Some((point, cell, score));
                }
            }
        }

        match (best_visible, best_any) {
            (Some((point, cell, score)), _) => Selection::OnScreen { point, cell, score },
            (None, Some((point, score))) => Selection::OffScreen { point, score },
            (None, None) => Selection::NoCandidates,
        }
    }
}
