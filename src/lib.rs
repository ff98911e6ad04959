#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::collapsible_if)]

//! Navigation engine for tile-based overworlds.
//!
//! An agent is moved one tile per tick toward global or on-screen goals:
//! a bounded A* plans inside the visible window, recorded quest and warp
//! paths supply intermediate targets, and a state machine guards against
//! loops and oscillation.

pub mod navigation;
