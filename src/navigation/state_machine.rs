//! Tick-driven navigation state machine.
//!
//! This module provides:
//! - [`Navigator`]: owns all mutable navigation state and exposes `step()`,
//! - [`NavWorld`]: the read-only data every navigator consults,
//! - [`NavigationGoal`] / [`NavigationState`]: what is pursued and how far along it is.
//!
//! The host loop calls [`Navigator::step`] once per tick. A step may chain
//! several state transitions (for example `Completed -> Planning -> Navigating`)
//! but emits at most one directional action.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use crate::navigation::config::NavigatorConfig;
use crate::navigation::coords::{Direction, GlobalCoord, LocalCoord, MapOffsetTable, ScreenCell, Transform};
use crate::navigation::emulator::Emulator;
use crate::navigation::error::Result;
use crate::navigation::memory::ProgressHistory;
use crate::navigation::planning::{GridPlanner, PlanStatus, PlanningWindow, TileCollisionRules};
use crate::navigation::recorded::RecordedPathStore;
use crate::navigation::selector::{IntermediateTargetSelector, Selection};

/// Upper bound on state transitions chained inside one `step()`.
const MAX_TRANSITIONS_PER_STEP: usize = 6;

/// Read-only data shared by every navigator.
#[derive(Clone, Debug, Default)]
pub struct NavWorld {
    pub offsets: MapOffsetTable,
    pub collisions: TileCollisionRules,
    pub paths: RecordedPathStore,
}

impl NavWorld {
    #[must_use]
    pub fn new(offsets: MapOffsetTable, collisions: TileCollisionRules, paths: RecordedPathStore) -> Self {
        Self {
            offsets,
            collisions,
            paths,
        }
    }
}

/// What the navigator is currently trying to reach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavigationGoal {
    /// A world-wide tile, possibly far off-screen.
    Global(GlobalCoord),
    /// A window cell relative to the agent position at the time it was set.
    /// It is pinned to a global tile on the first plan, so replans after a
    /// pause or a block still aim at the same tile.
    Local(ScreenCell),
    #[default]
    None,
}

impl fmt::Display for NavigationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(target) => write!(f, "global {target}"),
            Self::Local(cell) => write!(f, "local {cell}"),
            Self::None => f.write_str("none"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NavigationState {
    #[default]
    Idle,
    Planning,
    Navigating,
    Completed,
    Failed,
}

impl fmt::Display for NavigationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::Navigating => "navigating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one `step()` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepReport {
    pub message: String,
    /// The action sent to the emulator this tick, if any.
    pub action: Option<Direction>,
}

impl StepReport {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            action: None,
        }
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(action) => write!(f, "[{action}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Every mutable field of a navigator.
#[derive(Clone, Debug, Default)]
pub struct NavigatorState {
    pub state: NavigationState,
    pub goal: NavigationGoal,
    /// Non-empty only while `Navigating`.
    pub queue: VecDeque<Direction>,
    /// Positions seen at the end of each plan for the current global goal.
    pub history: ProgressHistory,
    pub no_progress: u32,
    /// Agent position recorded just before the last planning cycle.
    pub position_before_plan: Option<GlobalCoord>,
    /// Window cell of the last plan that ended short of its target.
    pub last_failed_target: Option<ScreenCell>,
    /// Global tile a local goal pointed at when it was first planned.
    pub local_anchor: Option<GlobalCoord>,
    pub last_plan: Option<PlanStatus>,
    pub last_message: String,
}

impl NavigatorState {
    /// Drops the queue and all per-goal bookkeeping.
    fn clear_progress(&mut self) {
        self.queue.clear();
        self.history.clear();
        self.no_progress = 0;
        self.position_before_plan = None;
        self.last_failed_target = None;
        self.local_anchor = None;
        self.last_plan = None;
    }
}

/// Outcome of one state handler: either keep chaining or end the tick.
enum Flow {
    Continue,
    Done(StepReport),
}

/// Drives one agent toward one goal at a time.
#[derive(Debug)]
pub struct Navigator {
    world: Arc<NavWorld>,
    config: NavigatorConfig,
    selector: IntermediateTargetSelector,
    planner: GridPlanner,
    state: NavigatorState,
}

impl Navigator {
    #[must_use]
    pub fn new(world: Arc<NavWorld>, config: NavigatorConfig) -> Self {
        Self {
            world,
            selector: IntermediateTargetSelector::from_config(&config),
            config,
            planner: GridPlanner::new(),
            state: NavigatorState::default(),
        }
    }

    #[must_use]
    pub fn world(&self) -> &Arc<NavWorld> {
        &self.world
    }

    #[must_use]
    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    #[must_use]
    pub fn navigation_status(&self) -> NavigationState {
        self.state.state
    }

    #[must_use]
    pub fn goal(&self) -> NavigationGoal {
        self.state.goal
    }

    #[must_use]
    pub fn pending_actions(&self) -> usize {
        self.state.queue.len()
    }

    #[must_use]
    pub fn last_message(&self) -> &str {
        &self.state.last_message
    }

    /// Targets a global tile. Cancels whatever was in flight.
    pub fn set_navigation_goal_global(&mut self, x: i32, y: i32) {
        self.set_goal(NavigationGoal::Global(GlobalCoord::new(x, y)));
    }

    /// Targets a window cell relative to the agent's current position.
    pub fn set_navigation_goal_local(&mut self, row: i32, col: i32) -> Result<()> {
        let cell = ScreenCell::try_new(row, col)?;
        self.set_goal(NavigationGoal::Local(cell));
        Ok(())
    }

    fn set_goal(&mut self, goal: NavigationGoal) {
        self.state.clear_progress();
        self.state.goal = goal;
        self.state.state = NavigationState::Planning;
        self.state.last_message = format!("Goal set: {goal}");
        tracing::info!(%goal, "navigation goal set");
    }

    /// Cancels the goal and returns to `Idle`.
    pub fn reset(&mut self) {
        self.state.clear_progress();
        self.state.goal = NavigationGoal::None;
        self.transition(NavigationState::Idle);
    }

    fn transition(&mut self, to: NavigationState) {
        if self.state.state != to {
            tracing::debug!(from = %self.state.state, %to, "navigation state change");
            self.state.state = to;
        }
    }

    fn finish(&mut self, report: StepReport) -> StepReport {
        self.state.last_message.clone_from(&report.message);
        report
    }

    /// Advances navigation by one tick; emits at most one action.
    pub fn step<E: Emulator + ?Sized>(&mut self, emu: &mut E) -> StepReport {
        if emu.dialog_active() {
            self.state.queue.clear();
            if self.state.state == NavigationState::Navigating {
                self.transition(NavigationState::Planning);
            }
            return self.finish(StepReport::message("Navigation paused: dialog active"));
        }

        for _ in 0..MAX_TRANSITIONS_PER_STEP {
            let flow = match self.state.state {
                NavigationState::Idle => Flow::Done(StepReport::message("Idle: no active navigation goal")),
                NavigationState::Planning => self.plan_step(emu),
                NavigationState::Navigating => Flow::Done(self.navigate_step(emu)),
                NavigationState::Completed => self.complete_step(&*emu),
                NavigationState::Failed => {
                    let message = format!("Failed -> idle: {}", self.state.last_message);
                    self.state.clear_progress();
                    self.state.goal = NavigationGoal::None;
                    self.transition(NavigationState::Idle);
                    Flow::Done(StepReport::message(message))
                }
            };
            if let Flow::Done(report) = flow {
                return self.finish(report);
            }
        }
        let message = format!("Navigation still {} after chained transitions; continuing next tick", self.state.state);
        self.finish(StepReport::message(message))
    }

    fn fail(&mut self, message: String) -> Flow {
        tracing::warn!(goal = %self.state.goal, "{message}");
        self.state.queue.clear();
        self.transition(NavigationState::Failed);
        Flow::Done(StepReport::message(message))
    }

    /// Marks the goal reached and idles.
    fn arrive(&mut self, message: String) -> Flow {
        tracing::info!(goal = %self.state.goal, "{message}");
        self.reset();
        Flow::Done(StepReport::message(message))
    }

    fn transform(&self) -> Transform<'_> {
        Transform::new(&self.world.offsets, self.config.tiles_per_cell)
    }

    /// Resolves an on-screen cell for a global target: directly, or via a recorded point.
    fn resolve_global(&self, agent: LocalCoord, target: GlobalCoord) -> std::result::Result<ScreenCell, String> {
        let transform = self.transform();
        if let Some(cell) = transform.global_to_screen(target, agent) {
            return Ok(cell);
        }
        match self.selector.select(&self.world.paths, &transform, agent, target) {
            Selection::OnScreen { point, cell, score } => {
                tracing::debug!(%point, %cell, score, "routing via recorded point");
                Ok(cell)
            }
            Selection::OffScreen { point, .. } => Err(format!(
                "Navigation failed: no on-screen target for {target}; best recorded point {point} is off-screen"
            )),
            Selection::NoCandidates => Err(format!(
                "Navigation failed: no on-screen target for {target}; map {} has no recorded points",
                agent.map_id
            )),
        }
    }

    fn plan_step<E: Emulator + ?Sized>(&mut self, emu: &mut E) -> Flow {
        let Some(agent) = emu.position().known() else {
            return Flow::Done(StepReport::message("Position unavailable; skipping tick"));
        };

        let goal = self.state.goal;
        let target_cell = match goal {
            NavigationGoal::None => {
                self.reset();
                return Flow::Done(StepReport::message("Idle: no active navigation goal"));
            }
            NavigationGoal::Local(cell) => {
                let transform = Transform::new(&self.world.offsets, self.config.tiles_per_cell);
                let anchor = match self.state.local_anchor {
                    Some(anchor) => anchor,
                    None => {
                        let Some(anchor) = transform.screen_to_global(cell, agent) else {
                            return self.fail(format!(
                                "Navigation failed: map {} has no offset entry; local target {cell} unreachable",
                                agent.map_id
                            ));
                        };
                        self.state.local_anchor = Some(anchor);
                        anchor
                    }
                };
                // The agent may have moved since the goal was set.
                match transform.global_to_screen(anchor, agent) {
                    Some(current) => current,
                    None => {
                        return self.fail(format!(
                            "Navigation failed: local target {cell} ({anchor}) is no longer on screen"
                        ))
                    }
                }
            }
            NavigationGoal::Global(target) => {
                let Some(agent_global) = self.world.offsets.local_to_global(agent) else {
                    return self.fail(format!(
                        "Navigation failed: map {} has no offset entry; {target} unreachable",
                        agent.map_id
                    ));
                };
                if agent_global.chebyshev(target) <= self.config.arrival_tolerance {
                    return self.arrive(format!("Reached global target {target}"));
                }
                self.state.position_before_plan = Some(agent_global);
                match self.resolve_global(agent, target) {
                    Ok(cell) => cell,
                    Err(message) => return self.fail(message),
                }
            }
        };

        if matches!(goal, NavigationGoal::Global(_)) && self.state.last_failed_target == Some(target_cell) {
            return self.fail(format!(
                "Navigation failed: planning loop, target cell {target_cell} was already unreachable"
            ));
        }

        let walkable = emu.terrain_window();
        let npcs = emu.sprite_cells();
        let fine_tiles = emu.fine_tiles();
        let window = PlanningWindow {
            walkable: &walkable,
            npcs: &npcs,
            fine_tiles: fine_tiles.as_ref(),
            rules: self.world.collisions.for_tileset_id(emu.tileset_id()),
        };
        let plan = self.planner.plan(&window, target_cell);
        tracing::debug!(
            status = ?plan.status,
            target = %target_cell,
            steps = plan.actions.len(),
            expanded = self.planner.last_expanded(),
            "planned"
        );

        self.state.last_plan = Some(plan.status);
        if plan.status == PlanStatus::ClosestReachable {
            self.state.last_failed_target = Some(target_cell);
        }
        let summary = plan.to_string();
        if plan.is_empty() {
            self.state.last_message = summary;
            self.transition(NavigationState::Completed);
            return Flow::Continue;
        }

        self.state.queue = plan.actions.into();
        self.transition(NavigationState::Navigating);
        let moved = self.navigate_step(emu);
        Flow::Done(StepReport {
            message: format!("{summary}; {}", moved.message),
            action: moved.action,
        })
    }

    fn navigate_step<E: Emulator + ?Sized>(&mut self, emu: &mut E) -> StepReport {
        let Some(direction) = self.state.queue.pop_front() else {
            self.transition(NavigationState::Completed);
            return StepReport::message("Action queue empty");
        };

        if let Some(next) = ScreenCell::CENTER.step(direction) {
            if emu.sprite_cells().contains(&next) {
                self.state.queue.clear();
                self.transition(NavigationState::Planning);
                tracing::debug!(cell = %next, "next cell occupied by a sprite");
                return StepReport::message(format!("Path blocked by NPC at {next}; replanning"));
            }
        }

        emu.emit_action(direction);
        let remaining = self.state.queue.len();
        if remaining == 0 {
            self.transition(NavigationState::Completed);
        }
        StepReport {
            message: format!("Moving {direction} ({remaining} queued)"),
            action: Some(direction),
        }
    }

    fn complete_step<E: Emulator + ?Sized>(&mut self, emu: &E) -> Flow {
        let target = match self.state.goal {
            NavigationGoal::Global(target) => target,
            NavigationGoal::Local(cell) => {
                let message = if self.state.last_plan == Some(PlanStatus::ClosestReachable) {
                    format!("Local target {cell} unreachable; stopped at the closest reachable cell")
                } else {
                    format!("Local target {cell} completed")
                };
                return self.arrive(message);
            }
            NavigationGoal::None => {
                self.reset();
                return Flow::Done(StepReport::message("Idle: no active navigation goal"));
            }
        };

        let position = emu.position();
        if position.is_sentinel() {
            return Flow::Done(StepReport::message("Position unavailable; skipping tick"));
        }
        let Some(current) = self.world.offsets.local_to_global(position) else {
            // Unknown map: planning reports it as unreachable.
            self.transition(NavigationState::Planning);
            return Flow::Continue;
        };
        if current.chebyshev(target) <= self.config.arrival_tolerance {
            return self.arrive(format!("Reached global target {target}"));
        }

        self.state.history.push(current);
        let stalled = self
            .state
            .position_before_plan
            .is_some_and(|before| current.manhattan(target) >= before.manhattan(target));
        let oscillating = self.state.history.occurrences(&current) >= self.config.oscillation_repeats;

        if stalled || oscillating {
            self.state.no_progress += 1;
            tracing::warn!(
                %current,
                %target,
                stalled,
                oscillating,
                count = self.state.no_progress,
                "no progress toward global target"
            );
            if self.state.no_progress >= self.config.no_progress_threshold {
                let message = format!(
                    "Navigation abandoned: no progress toward {target} after {} attempts",
                    self.state.no_progress
                );
                tracing::warn!("{message}");
                self.reset();
                return Flow::Done(StepReport::message(message));
            }
        } else {
            self.state.no_progress = 0;
        }

        self.transition(NavigationState::Planning);
        Flow::Continue
    }

    /// Multi-line summary of goal, state, queue and progress bookkeeping.
    #[must_use]
    pub fn status_report(&self) -> String {
        let s = &self.state;
        let mut out = String::new();
        let _ = writeln!(out, "state: {}", s.state);
        let _ = writeln!(out, "goal: {}", s.goal);
        let _ = writeln!(out, "pending actions: {}", s.queue.len());
        let _ = writeln!(
            out,
            "no-progress count: {}/{}",
            s.no_progress, self.config.no_progress_threshold
        );
        let history = s.history.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        let _ = writeln!(out, "recent positions: [{history}]");
        if let Some(cell) = s.last_failed_target {
            let _ = writeln!(out, "last unreachable cell: {cell}");
        }
        if let Some(anchor) = s.local_anchor {
            let _ = writeln!(out, "local target tile: {anchor}");
        }
        let _ = write!(out, "last status: {}", s.last_message);
        out
    }
}
