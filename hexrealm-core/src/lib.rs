//! HEXREALM Core - World simulation engine
//!
//! This crate provides the core logic for HEXREALM:
//! - Hex geometry (axial coordinates, six directions)
//! - Tile kind catalog and the tile graph with adjacency and registries
//! - Realm propagation, pathfinding and procedural world generation
//! - Player inventories, entity carrying and combat
//! - Turn sequencing, construction and a greedy bot

pub mod board;
pub mod catalog;
pub mod inventory;
pub mod error;
pub mod player;
pub mod entity;
pub mod events;
pub mod graph;
pub mod realm;
pub mod pathfinder;
pub mod config;
pub mod generator;
pub mod game;
pub mod carry;
pub mod construction;
pub mod bot;
pub mod summary;

// Re-exports for convenient access
pub use board::{Direction, Hex, DIRECTIONS, TILE_DIAMETER, TILE_HEIGHT};
pub use catalog::{get_tile_kind, tile_kind_by_name, EntityKindId, TileKind, TileKindId, TILE_KINDS};
pub use inventory::{Inventory, Resource, Resources};
pub use error::{ActionError, WorldError};
pub use player::{PlayerId, PlayerState, MAX_CARRIED};
pub use entity::{Entity, EntityId, EntityStore};
pub use events::{EventBus, GameEvent, SubscriptionId};
pub use graph::{TileGraph, TileId, TileInstance, MAX_ENTITIES_PER_TILE};
pub use realm::{holds_ownable, realm_of, update_realms};
pub use pathfinder::find_path;
pub use config::{GameConfig, GenerationConfig, PlayerConfig, MAX_PLAYERS};
pub use generator::{seed_from_string, GeneratedWorld, WorldGenerator};
pub use game::{Game, GameResult, Rules};
pub use construction::ROAD_COST;
pub use bot::{GreedyBot, TurnReport};
pub use summary::WorldSummary;
