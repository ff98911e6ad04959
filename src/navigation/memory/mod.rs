//! Short-term memory of where the agent has been.
//!
//! The navigator remembers the last few global positions reached while it
//! pursues one global goal, and uses them to notice when it is walking back
//! and forth instead of closing in.

mod ring_buffer;

pub use ring_buffer::RingBuffer;

use crate::navigation::coords::GlobalCoord;
use crate::navigation::params::PROGRESS_HISTORY_LEN;

/// Recent global positions reached while pursuing the current global goal.
pub type ProgressHistory = RingBuffer<GlobalCoord, PROGRESS_HISTORY_LEN>;
