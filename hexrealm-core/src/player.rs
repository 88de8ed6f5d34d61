//! Player state: score, inventory and the carried-entity hand

use crate::board::Hex;
use crate::entity::EntityId;
use crate::inventory::Inventory;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a player in the game's player list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Maximum number of entities a player can carry at once
pub const MAX_CARRIED: usize = 4;

#[derive(Clone, Debug)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub score: i32,
    pub defeated: bool,
    pub inventory: Inventory,
    /// Camera anchor (x, y, z) in world space
    pub camera_anchor: (f64, f64, f64),
    pub(crate) hand: Vec<EntityId>,
    pub(crate) entity_source: Option<Hex>,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
            score: 0,
            defeated: false,
            inventory: Inventory::new(),
            camera_anchor: (0.0, 0.0, 0.0),
            hand: Vec::new(),
            entity_source: None,
        }
    }

    pub fn carries_entities(&self) -> bool {
        !self.hand.is_empty()
    }

    pub fn carried_count(&self) -> usize {
        self.hand.len()
    }

    /// Carried entities, bottom first
    pub fn hand(&self) -> &[EntityId] {
        &self.hand
    }

    /// Position the carried entities were picked up from
    pub fn entity_source(&self) -> Option<Hex> {
        self.entity_source
    }
}
