//! The navigator's view of the running game.
//!
//! Everything the navigator knows about the world arrives through
//! [`Emulator`]; everything it does leaves through [`Emulator::emit_action`].

use std::collections::HashSet;

use crate::navigation::coords::{Direction, LocalCoord, ScreenCell};
use crate::navigation::params::{FINE_COLS, FINE_ROWS, WINDOW_COLS, WINDOW_ROWS};

/// Walkability of each window cell, row-major.
pub type WalkabilityGrid = [[bool; WINDOW_COLS]; WINDOW_ROWS];

/// Background tile ids of the window at 8px resolution.
pub type FineTileGrid = [[u8; FINE_COLS]; FINE_ROWS];

/// Query and input surface of the game the agent is playing.
pub trait Emulator {
    /// Agent position; the sentinel when the game cannot report one.
    fn position(&self) -> LocalCoord;

    /// Walkable flags for the window centered on the agent.
    fn terrain_window(&self) -> WalkabilityGrid;

    /// Window cells currently occupied by NPC sprites.
    fn sprite_cells(&self) -> HashSet<ScreenCell>;

    /// Numeric id of the tileset the current map is drawn with.
    fn tileset_id(&self) -> u8;

    /// Background tiles of the window, if the emulator exposes them.
    fn fine_tiles(&self) -> Option<FineTileGrid> {
        None
    }

    /// Text of an open dialog, menu or script lock.
    fn dialog_text(&self) -> Option<String>;

    /// Presses one direction for one step.
    fn emit_action(&mut self, direction: Direction);

    /// True while a dialog or script lock blocks movement.
    fn dialog_active(&self) -> bool {
        self.dialog_text().is_some_and(|text| !text.trim().is_empty())
    }
}

/// Overworld tilesets, indexed by their in-game id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tileset {
    Overworld,
    RedsHouse1,
    Mart,
    Forest,
    RedsHouse2,
    Dojo,
    Pokecenter,
    Gym,
    House,
    ForestGate,
    Museum,
    Underground,
    Gate,
    Ship,
    ShipPort,
    Cemetery,
    Interior,
    Cavern,
    Lobby,
    Mansion,
    Lab,
    Club,
    Facility,
    Plateau,
}

impl Tileset {
    const BY_ID: [Tileset; 24] = [
        Tileset::Overworld,
        Tileset::RedsHouse1,
        Tileset::Mart,
        Tileset::Forest,
        Tileset::RedsHouse2,
        Tileset::Dojo,
        Tileset::Pokecenter,
        Tileset::Gym,
        Tileset::House,
        Tileset::ForestGate,
        Tileset::Museum,
        Tileset::Underground,
        Tileset::Gate,
        Tileset::Ship,
        Tileset::ShipPort,
        Tileset::Cemetery,
        Tileset::Interior,
        Tileset::Cavern,
        Tileset::Lobby,
        Tileset::Mansion,
        Tileset::Lab,
        Tileset::Club,
        Tileset::Facility,
        Tileset::Plateau,
    ];

    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::BY_ID.get(usize::from(id)).copied()
    }

    /// Key used for this tileset in the collision rule file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Overworld => "OVERWORLD",
            Self::RedsHouse1 => "REDS_HOUSE_1",
            Self::Mart => "MART",
            Self::Forest => "FOREST",
            Self::RedsHouse2 => "REDS_HOUSE_2",
            Self::Dojo => "DOJO",
            Self::Pokecenter => "POKECENTER",
            Self::Gym => "GYM",
            Self::House => "HOUSE",
            Self::ForestGate => "FOREST_GATE",
            Self::Museum => "MUSEUM",
            Self::Underground => "UNDERGROUND",
            Self::Gate => "GATE",
            Self::Ship => "SHIP",
            Self::ShipPort => "SHIP_PORT",
            Self::Cemetery => "CEMETERY",
            Self::Interior => "INTERIOR",
            Self::Cavern => "CAVERN",
            Self::Lobby => "LOBBY",
            Self::Mansion => "MANSION",
            Self::Lab => "LAB",
            Self::Club => "CLUB",
            Self::Facility => "FACILITY",
            Self::Plateau => "PLATEAU",
        }
    }
}
