//! Fixed navigation constants.

/// Rows in the on-screen window.
pub const WINDOW_ROWS: usize = 9;
/// Columns in the on-screen window.
pub const WINDOW_COLS: usize = 10;
/// Window row the agent always occupies.
pub const CENTER_ROW: usize = 4;
/// Window column the agent always occupies.
pub const CENTER_COL: usize = 4;

/// Fine (8px) background tiles per window cell along each axis.
pub const FINE_TILES_PER_CELL: usize = 2;
pub const FINE_ROWS: usize = WINDOW_ROWS * FINE_TILES_PER_CELL;
pub const FINE_COLS: usize = WINDOW_COLS * FINE_TILES_PER_CELL;

/// Pixel size of one window cell.
pub const CELL_PIXELS: i32 = 16;

/// Padding added around every map when placed on the global grid.
pub const GLOBAL_PAD: i32 = 20;

/// Positions remembered for oscillation detection.
pub const PROGRESS_HISTORY_LEN: usize = 5;

pub const DEFAULT_AGENT_WEIGHT: f64 = 0.4;
pub const DEFAULT_TARGET_WEIGHT: f64 = 0.6;
pub const DEFAULT_ARRIVAL_TOLERANCE: i32 = 1;
pub const DEFAULT_NO_PROGRESS_THRESHOLD: u32 = 2;
pub const DEFAULT_OSCILLATION_REPEATS: usize = 2;
pub const DEFAULT_MAX_ADVANCES_PER_TICK: usize = 16;

/// Manhattan distance from the last issued recorded point beyond which the
/// follower re-snaps before advancing.
pub const DRIFT_TOLERANCE: i32 = 3;
/// Recorded points searched behind the last issued one when re-snapping.
pub const RECOVERY_BEHIND: usize = 5;
/// Recorded points searched from the last issued one onward when re-snapping.
pub const RECOVERY_AHEAD: usize = 10;
