//! Error types for world construction and player actions

use crate::board::Hex;
use crate::catalog::TileKindId;
use crate::graph::TileId;
use crate::player::PlayerId;

/// Failures while building or mutating the tile graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("position {0:?} is already occupied")]
    Occupied(Hex),

    #[error("tile handle {0:?} is stale")]
    StaleTile(TileId),

    #[error("no tile at {0:?}")]
    MissingTile(Hex),

    #[error("player count must be between 1 and {max}, got {count}")]
    InvalidPlayerCount { count: usize, max: usize },
}

/// A rejected player action. State is never partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    #[error("the game is over")]
    GameOver,

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("not enough resources")]
    InsufficientResources,

    #[error("cannot carry more entities")]
    HandFull,

    #[error("nothing to grab here")]
    NothingToGrab,

    #[error("not carrying any entities")]
    EmptyHand,

    #[error("carried entities come from another tile")]
    SourceMismatch,

    #[error("target is not adjacent to the source tile")]
    NotAdjacent,

    #[error("target is obstructed")]
    Obstructed,

    #[error("too few entities to enter the target")]
    TooWeak,

    #[error("tile is not owned by the player")]
    NotOwner,

    #[error("tile is not in the player's realm")]
    NotOccupied,

    #[error("{0} cannot be built here")]
    BuildRestricted(TileKindId),

    #[error("no facility slots left")]
    FacilityLimit,

    #[error("tile cannot be upgraded")]
    NotUpgradable,

    #[error("tile is already a road")]
    AlreadyRoad,

    #[error("tile handle {0:?} is stale")]
    StaleTile(TileId),
}
