pub mod config;
pub mod coords;
pub mod emulator;
pub mod environment;
pub mod error;
pub mod follower;
pub mod memory;
pub mod params;
pub mod planning;
pub mod recorded;
pub mod selector;
pub mod state_machine;

pub use config::NavigatorConfig;
pub use coords::{Direction, GlobalCoord, LocalCoord, MapId, MapOffsetTable, ScreenCell, Transform};
pub use emulator::{Emulator, Tileset};
pub use environment::{GridMap, GridWorld};
pub use error::{NavError, Result};
pub use follower::{follow_recorded_path, FollowReport, FollowStep, FollowStop, QuestPathFollower};
pub use recorded::{QuestId, RecordedPathStore};
pub use selector::{IntermediateTargetSelector, Selection};
pub use state_machine::{NavWorld, NavigationGoal, NavigationState, Navigator, StepReport};
