//! Quest path following.
//!
//! [`QuestPathFollower`] walks the recorded points of one quest map by map,
//! handing each point to a [`Navigator`] as a global goal. Maps without quest
//! data are crossed along their recorded warp corridor instead.
//! [`follow_recorded_path`] is the host-loop driver tying the two together.

use std::fmt;
use std::sync::Arc;

use crate::navigation::coords::{Direction, GlobalCoord, MapId};
use crate::navigation::emulator::Emulator;
use crate::navigation::params::{DRIFT_TOLERANCE, RECOVERY_AHEAD, RECOVERY_BEHIND};
use crate::navigation::recorded::QuestId;
use crate::navigation::state_machine::{NavigationState, Navigator};

/// Progress through a map's warp corridor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WarpCursor {
    pub index: usize,
}

/// Which recorded data a goal came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSource {
    Quest,
    /// First point of the quest's next map.
    NextMap,
    Warp,
}

/// Outcome of one [`QuestPathFollower::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowStep {
    /// A new global goal was handed to the navigator.
    Goal {
        map_id: MapId,
        index: usize,
        point: GlobalCoord,
        source: PathSource,
    },
    /// Neither quest nor warp data covers the current map.
    NoData { map_id: MapId },
    /// The last point of the quest's last map was already issued.
    Finished,
    PositionUnavailable,
}

impl FollowStep {
    /// True when a goal was set.
    #[must_use]
    pub const fn advanced(&self) -> bool {
        matches!(self, Self::Goal { .. })
    }
}

impl fmt::Display for FollowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Goal {
                map_id,
                index,
                point,
                source,
            } => write!(f, "Next goal {point} (map {map_id}, {source:?} point {index})"),
            Self::NoData { map_id } => write!(f, "No recorded path data for map {map_id}"),
            Self::Finished => f.write_str("Quest path complete: no more steps"),
            Self::PositionUnavailable => f.write_str("Position unavailable; cannot follow path"),
        }
    }
}

/// Cursor over one quest's recorded path.
#[derive(Clone, Debug)]
pub struct QuestPathFollower {
    quest: QuestId,
    map_id: Option<MapId>,
    /// Next quest point to issue on `map_id`.
    index: usize,
    /// Last quest point issued on `map_id`.
    issued: Option<usize>,
    warp: Option<WarpCursor>,
    /// The warp corridor of `map_id` was walked to its end.
    warp_exhausted: bool,
}

impl QuestPathFollower {
    #[must_use]
    pub fn new(quest: QuestId) -> Self {
        Self {
            quest,
            map_id: None,
            index: 0,
            issued: None,
            warp: None,
            warp_exhausted: false,
        }
    }

    #[must_use]
    pub const fn quest(&self) -> QuestId {
        self.quest
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn warp_cursor(&self) -> Option<WarpCursor> {
        self.warp
    }

    fn reset_cursors(&mut self, map_id: MapId) {
        if self.map_id.is_some() {
            tracing::debug!(quest = self.quest, map_id, "map changed, resetting path cursors");
        }
        self.map_id = Some(map_id);
        self.index = 0;
        self.issued = None;
        self.warp = None;
        self.warp_exhausted = false;
    }

    /// Hands the next recorded point to `nav` as a global goal.
    pub fn advance<E: Emulator + ?Sized>(&mut self, nav: &mut Navigator, emu: &E) -> FollowStep {
        let Some(agent) = emu.position().known() else {
            return FollowStep::PositionUnavailable;
        };
        let map_id = agent.map_id;
        if self.map_id != Some(map_id) {
            self.reset_cursors(map_id);
        }

        let world = Arc::clone(nav.world());
        let paths = &world.paths;

        let step = if let Some(points) = paths.quest_path(self.quest, map_id) {
            if let Some(here) = world.offsets.local_to_global(agent) {
                self.recover_from_drift(points, here);
            }
            if let Some(&point) = points.get(self.index) {
                let index = self.index;
                self.index += 1;
                self.issued = Some(index);
                FollowStep::Goal {
                    map_id,
                    index,
                    point,
                    source: PathSource::Quest,
                }
            } else {
                match paths.next_quest_map(self.quest, map_id) {
                    // Cursors are reset once the agent actually enters the next map.
                    Some((next_map, next_points)) => match next_points.first() {
                        Some(&point) => {
                            self.warp = None;
                            self.issued = None;
                            FollowStep::Goal {
                                map_id: next_map,
                                index: 0,
                                point,
                                source: PathSource::NextMap,
                            }
                        }
                        None => FollowStep::NoData { map_id: next_map },
                    },
                    None => FollowStep::Finished,
                }
            }
        } else {
            self.advance_warp(paths.warp_path(map_id), map_id)
        };

        if let FollowStep::Goal { point, .. } = step {
            nav.set_navigation_goal_global(point.x, point.y);
        }
        tracing::debug!(quest = self.quest, %step, "follower advanced");
        step
    }

    /// Re-anchors the cursor when the agent ended up far from the last issued
    /// point. Only points within a small window around that point are searched.
    fn recover_from_drift(&mut self, points: &[GlobalCoord], here: GlobalCoord) {
        let Some(issued) = self.issued else {
            return;
        };
        let Some(&expected) = points.get(issued) else {
            return;
        };
        let drift = expected.manhattan(here);
        if drift <= DRIFT_TOLERANCE {
            return;
        }
        let start = issued.saturating_sub(RECOVERY_BEHIND);
        let end = (issued + RECOVERY_AHEAD).min(points.len());
        let Some((nearest, _)) = points[start..end]
            .iter()
            .enumerate()
            .min_by_key(|(_, point)| point.manhattan(here))
        else {
            return;
        };
        let nearest = start + nearest;
        tracing::info!(
            quest = self.quest,
            %here,
            %expected,
            drift,
            nearest,
            "off the recorded path, resuming after nearest point"
        );
        self.index = nearest + 1;
    }

    fn advance_warp(&mut self, warp: Option<&[GlobalCoord]>, map_id: MapId) -> FollowStep {
        let Some(points) = warp.filter(|_| !self.warp_exhausted) else {
            return FollowStep::NoData { map_id };
        };
        let cursor = self.warp.get_or_insert_with(WarpCursor::default);
        if let Some(&point) = points.get(cursor.index) {
            let index = cursor.index;
            cursor.index += 1;
            return FollowStep::Goal {
                map_id,
                index,
                point,
                source: PathSource::Warp,
            };
        }
        // Corridor walked without leaving the map; there is nothing left to try here.
        self.warp = None;
        self.warp_exhausted = true;
        FollowStep::NoData { map_id }
    }

    /// Moves the cursor to the recorded point nearest the agent.
    ///
    /// Returns the new index, or `None` when the map has no quest data.
    pub fn snap_to_nearest<E: Emulator + ?Sized>(&mut self, nav: &Navigator, emu: &E) -> Option<usize> {
        let agent = emu.position().known()?;
        let here = nav.world().offsets.local_to_global(agent)?;
        let points = nav.world().paths.quest_path(self.quest, agent.map_id)?;
        let (nearest, _) = points
            .iter()
            .enumerate()
            .min_by_key(|(_, point)| point.manhattan(here))?;
        self.reset_cursors(agent.map_id);
        self.index = nearest;
        tracing::info!(quest = self.quest, map_id = agent.map_id, index = nearest, "snapped to nearest recorded point");
        Some(nearest)
    }
}

/// Why [`follow_recorded_path`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowStop {
    /// All requested ticks were used.
    StepsExhausted,
    Finished,
    NoData { map_id: MapId },
}

/// Summary of a [`follow_recorded_path`] run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FollowReport {
    pub ticks: usize,
    pub actions: Vec<Direction>,
    pub stop: FollowStop,
    pub last_message: String,
}

/// Runs up to `n_steps` ticks of quest following.
///
/// Whenever the navigator is idle the follower issues the next goal. Goals
/// that resolve without moving are skipped within the same tick, up to
/// `max_advances_per_tick` of them. Each tick emits at most one action.
pub fn follow_recorded_path<E: Emulator + ?Sized>(
    nav: &mut Navigator,
    follower: &mut QuestPathFollower,
    emu: &mut E,
    n_steps: usize,
) -> FollowReport {
    let max_advances = nav.config().max_advances_per_tick.max(1);
    let mut actions = Vec::new();
    let mut last_message = String::new();

    for tick in 0..n_steps {
        if emu.dialog_active() {
            last_message = nav.step(emu).message;
            continue;
        }

        for _ in 0..max_advances {
            if nav.navigation_status() == NavigationState::Idle {
                let step = follower.advance(nav, &*emu);
                match step {
                    FollowStep::Goal { .. } => {}
                    FollowStep::PositionUnavailable => {
                        last_message = step.to_string();
                        break;
                    }
                    FollowStep::Finished => {
                        return FollowReport {
                            ticks: tick,
                            actions,
                            stop: FollowStop::Finished,
                            last_message: step.to_string(),
                        };
                    }
                    FollowStep::NoData { map_id } => {
                        return FollowReport {
                            ticks: tick,
                            actions,
                            stop: FollowStop::NoData { map_id },
                            last_message: step.to_string(),
                        };
                    }
                }
            }

            let report = nav.step(emu);
            last_message = report.message;
            if let Some(action) = report.action {
                actions.push(action);
                break;
            }
            if nav.navigation_status() != NavigationState::Idle {
                break;
            }
        }
    }

    FollowReport {
        ticks: n_steps,
        actions,
        stop: FollowStop::StepsExhausted,
        last_message,
    }
}
