//! Entity arena: units owned by players

use crate::catalog::{EntityKind, EntityKindId};
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

/// A unit on the map or in a player's hand
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKindId,
    pub owner: PlayerId,
    /// Moved this turn; cleared when the owner's turn starts
    pub moved: bool,
}

impl Entity {
    pub fn kind(&self) -> &'static EntityKind {
        self.kind.kind()
    }
}

/// Every live entity. Destroyed slots are never reused.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    slots: Vec<Option<Entity>>,
    live: usize,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, kind: EntityKindId, owner: PlayerId) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        self.slots.push(Some(Entity { kind, owner, moved: false }));
        self.live += 1;
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn destroy(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.slots.get_mut(id.0 as usize).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn owner(&self, id: EntityId) -> Option<PlayerId> {
        self.get(id).map(|e| e.owner)
    }

    pub fn set_moved(&mut self, id: EntityId, moved: bool) {
        if let Some(entity) = self.get_mut(id) {
            entity.moved = moved;
        }
    }

    /// Make all of a player's entities movable again
    pub fn reset_moved(&mut self, player: PlayerId) {
        for entity in self.slots.iter_mut().flatten() {
            if entity.owner == player {
                entity.moved = false;
            }
        }
    }

    pub fn owned_by(&self, player: PlayerId) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, e)| e.owner == player)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (EntityId(i as u32), e)))
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
