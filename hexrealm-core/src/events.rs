//! Observer registry for game notifications
//!
//! Listeners are called synchronously in subscription order.

use crate::board::Hex;
use crate::catalog::TileKindId;
use crate::error::ActionError;
use crate::player::PlayerId;
use std::fmt;
use tracing::trace;

/// Notifications published by the game
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    TurnStarted { player: PlayerId },
    PlayersChanged,
    InventoryChanged { player: PlayerId },
    CapacityChanged { player: PlayerId },
    EntitiesChanged { player: PlayerId },
    /// Error cue for a rejected action
    ActionRejected { player: PlayerId, error: ActionError },
    TileBuilt { player: PlayerId, at: Hex, kind: TileKindId },
    TileDestroyed { by: PlayerId, at: Hex, kind: TileKindId },
    RoadBuilt { player: PlayerId, at: Hex },
    PlayerDefeated { player: PlayerId },
    PlayerWon { player: PlayerId },
    PlayerDone { player: PlayerId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&GameEvent)>;

#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn publish(&mut self, event: &GameEvent) {
        trace!(?event, listeners = self.listeners.len(), "publish");
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
