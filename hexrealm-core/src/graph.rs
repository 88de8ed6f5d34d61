//! Tile graph: placed tile instances keyed by hex position
//!
//! Tiles live in an arena indexed by `TileId`. Replacing a tile always
//! allocates a fresh slot, so a handle to the replaced tile goes stale:
//! `get` returns `None` and indexing panics. Slots are never reused, which
//! keeps arena order equal to creation order.

use crate::board::{Direction, Hex};
use crate::catalog::{TileKind, TileKindId, KIND_COUNT};
use crate::entity::EntityId;
use crate::error::WorldError;
use crate::player::PlayerId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Index;

/// Entities that fit on one tile
pub const MAX_ENTITIES_PER_TILE: usize = 4;

/// Stream of the rotation RNG, kept apart from the generator's stream
const ROTATION_STREAM: u64 = 2;

/// Handle to a placed tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(u32);

impl TileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

// ============================================================================
// TILE INSTANCE
// ============================================================================

/// A placed tile
#[derive(Clone, Debug)]
pub struct TileInstance {
    pub(crate) kind: TileKindId,
    pub(crate) hex: Hex,
    pub(crate) rotation: u8,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) occupant: Option<PlayerId>,
    /// Entity stack, top last
    pub(crate) entities: Vec<EntityId>,
    pub(crate) controlled_by: Option<TileId>,
    pub(crate) facilities: Vec<TileId>,
    /// Facility positions of the settlement that stood here before it fell
    pub(crate) former_facilities: Vec<Hex>,
    pub(crate) road: bool,
    pub(crate) road_links: u8,
    pub(crate) landmark: bool,
}

impl TileInstance {
    fn new(kind: TileKindId, hex: Hex, rotation: u8) -> Self {
        Self {
            kind,
            hex,
            rotation,
            owner: None,
            occupant: None,
            entities: Vec::new(),
            controlled_by: None,
            facilities: Vec::new(),
            former_facilities: Vec::new(),
            road: false,
            road_links: 0,
            landmark: false,
        }
    }

    pub fn kind(&self) -> TileKindId {
        self.kind
    }

    pub fn def(&self) -> &'static TileKind {
        self.kind.kind()
    }

    pub fn hex(&self) -> Hex {
        self.hex
    }

    /// Rotation seed in 0..6 (multiples of 60 degrees)
    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Player in whose realm the tile lies
    pub fn occupant(&self) -> Option<PlayerId> {
        self.occupant
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }

    pub fn top_entity(&self) -> Option<EntityId> {
        self.entities.last().copied()
    }

    pub fn controlled_by(&self) -> Option<TileId> {
        self.controlled_by
    }

    pub fn facilities(&self) -> &[TileId] {
        &self.facilities
    }

    pub fn former_facilities(&self) -> &[Hex] {
        &self.former_facilities
    }

    pub fn is_road(&self) -> bool {
        self.road
    }

    /// Bitmask of directions (bit = direction index) with a visible road link
    pub fn road_links(&self) -> u8 {
        self.road_links
    }

    pub fn is_landmark(&self) -> bool {
        self.landmark
    }
}

// ============================================================================
// TILE GRAPH
// ============================================================================

#[derive(Clone, Debug)]
pub struct TileGraph {
    tiles: Vec<Option<TileInstance>>,
    positions: FxHashMap<Hex, TileId>,
    buckets: Vec<Vec<TileId>>,
    origin: Option<TileId>,
    last: Option<TileId>,
    rng: ChaCha8Rng,
}

impl Default for TileGraph {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TileGraph {
    /// Empty graph whose rotation seeds derive from `seed`
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(ROTATION_STREAM);
        Self {
            tiles: Vec::new(),
            positions: FxHashMap::default(),
            buckets: vec![Vec::new(); KIND_COUNT],
            origin: None,
            last: None,
            rng,
        }
    }

    /// Number of live tiles
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, id: TileId) -> Option<&TileInstance> {
        self.tiles.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut TileInstance> {
        self.tiles.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.get(id).is_some()
    }

    pub fn at(&self, hex: Hex) -> Option<TileId> {
        self.positions.get(&hex).copied()
    }

    pub fn tile_at(&self, hex: Hex) -> Option<&TileInstance> {
        self.at(hex).and_then(|id| self.get(id))
    }

    pub fn kind_of(&self, id: TileId) -> Option<TileKindId> {
        self.get(id).map(|t| t.kind)
    }

    /// First tile ever created (follows replacements)
    pub fn origin(&self) -> Option<TileId> {
        self.origin
    }

    /// Most recently created tile
    pub fn last(&self) -> Option<TileId> {
        self.last
    }

    // ------------------------------------------------------------------------
    // Creation and replacement
    // ------------------------------------------------------------------------

    pub fn create(&mut self, kind: TileKindId, hex: Hex) -> Result<TileId, WorldError> {
        if self.positions.contains_key(&hex) {
            return Err(WorldError::Occupied(hex));
        }
        let id = self.insert(TileInstance::new(kind, hex, 0));
        self.buckets[kind.index()].push(id);
        if kind.kind().connects_to_road {
            self.refresh_neighbor_links(hex);
        }
        Ok(id)
    }

    /// Substitute a tile with a new one of `kind` at the same position.
    ///
    /// Entities, facility relations and the road flag move to the new tile;
    /// ownership does not. The returned handle is the only valid one.
    pub fn replace(&mut self, original: TileId, kind: TileKindId) -> Result<TileId, WorldError> {
        let old = self
            .tiles
            .get_mut(original.index())
            .and_then(Option::take)
            .ok_or(WorldError::StaleTile(original))?;
        self.positions.remove(&old.hex);

        let bucket = &mut self.buckets[old.kind.index()];
        let slot = bucket.iter().position(|t| *t == original);
        if let Some(i) = slot {
            bucket.remove(i);
        }

        let mut tile = TileInstance::new(kind, old.hex, 0);
        tile.occupant = old.occupant;
        tile.entities = old.entities;
        tile.controlled_by = old.controlled_by;
        tile.facilities = old.facilities;
        tile.former_facilities = old.former_facilities;
        tile.road = old.road;
        let id = self.insert(tile);

        match slot {
            Some(i) if old.kind == kind => self.buckets[kind.index()].insert(i, id),
            _ => self.buckets[kind.index()].push(id),
        }

        if self.origin == Some(original) {
            self.origin = Some(id);
        }
        self.relink(original, id);
        self.refresh_road_links(id);
        if kind.kind().connects_to_road || old.kind.kind().connects_to_road {
            self.refresh_neighbor_links(old.hex);
        }
        Ok(id)
    }

    /// Delete a tile, detaching its facility relations
    pub fn remove(&mut self, id: TileId) -> Result<TileInstance, WorldError> {
        self.detach_facility(id);
        let tile = self
            .tiles
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(WorldError::StaleTile(id))?;
        self.positions.remove(&tile.hex);
        self.buckets[tile.kind.index()].retain(|t| *t != id);
        for facility in &tile.facilities {
            if let Some(f) = self.get_mut(*facility) {
                f.controlled_by = None;
            }
        }
        if self.origin == Some(id) {
            self.origin = None;
        }
        if self.last == Some(id) {
            self.last = None;
        }
        self.refresh_neighbor_links(tile.hex);
        Ok(tile)
    }

    fn insert(&mut self, mut tile: TileInstance) -> TileId {
        tile.rotation = self.rng.gen_range(0..6);
        let id = TileId(self.tiles.len() as u32);
        self.positions.insert(tile.hex, id);
        self.tiles.push(Some(tile));
        self.origin.get_or_insert(id);
        self.last = Some(id);
        id
    }

    /// Point every facility relation at `new` instead of `old`
    fn relink(&mut self, old: TileId, new: TileId) {
        let (parent, facilities) = match self.get(new) {
            Some(t) => (t.controlled_by, t.facilities.clone()),
            None => return,
        };
        if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
            for f in parent.facilities.iter_mut().filter(|f| **f == old) {
                *f = new;
            }
        }
        for facility in facilities {
            if let Some(f) = self.get_mut(facility) {
                f.controlled_by = Some(new);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------------

    pub fn neighbor(&self, id: TileId, direction: Direction) -> Option<TileId> {
        let hex = self.get(id)?.hex;
        self.at(hex.neighbor(direction))
    }

    /// Existing neighbors in direction order
    pub fn neighbors(&self, id: TileId) -> Vec<TileId> {
        match self.get(id) {
            Some(tile) => self.neighbors_at(tile.hex),
            None => Vec::new(),
        }
    }

    pub fn neighbors_at(&self, hex: Hex) -> Vec<TileId> {
        Direction::ALL
            .iter()
            .filter_map(|d| self.at(hex.neighbor(*d)))
            .collect()
    }

    pub fn are_neighbors(&self, a: TileId, b: TileId) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.hex.distance_to(b.hex) == 1,
            _ => false,
        }
    }

    /// Tiles within `radius` hops, center first, in breadth-first order.
    /// A non-empty `filter` keeps only those kinds.
    pub fn area(&self, center: TileId, radius: u32, filter: &[TileKindId]) -> Vec<TileId> {
        let Some(start) = self.get(center) else {
            return Vec::new();
        };
        let mut seen = FxHashSet::default();
        let mut order = vec![center];
        let mut frontier = VecDeque::from([(start.hex, 0u32)]);
        seen.insert(center);

        while let Some((hex, depth)) = frontier.pop_front() {
            if depth >= radius {
                continue;
            }
            for next in self.neighbors_at(hex) {
                if seen.insert(next) {
                    order.push(next);
                    frontier.push_back((self[next].hex, depth + 1));
                }
            }
        }

        if filter.is_empty() {
            order
        } else {
            order.retain(|id| filter.contains(&self[*id].kind));
            order
        }
    }

    // ------------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------------

    /// Tiles of one kind in bucket order
    pub fn all(&self, kind: TileKindId) -> &[TileId] {
        &self.buckets[kind.index()]
    }

    /// Tiles of several kinds, bucket by bucket
    pub fn all_of(&self, kinds: &[TileKindId]) -> Vec<TileId> {
        kinds
            .iter()
            .flat_map(|k| self.buckets[k.index()].iter().copied())
            .collect()
    }

    pub fn count(&self, kind: TileKindId) -> usize {
        self.buckets[kind.index()].len()
    }

    /// Live tiles in creation order
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileInstance)> {
        self.tiles
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.as_ref().map(|t| (TileId(i as u32), t)))
    }

    pub fn owned_by(&self, player: PlayerId) -> Vec<TileId> {
        self.iter()
            .filter(|(_, t)| t.owner == Some(player))
            .map(|(id, _)| id)
            .collect()
    }

    /// (max |x|, max |z|) over every tile except deep ocean
    pub fn bounds(&self) -> (f64, f64) {
        self.iter()
            .filter(|(_, t)| t.kind != TileKindId::DeepOcean)
            .map(|(_, t)| t.hex.to_world())
            .fold((0.0, 0.0), |(mx, mz), (x, z)| (mx.max(x.abs()), mz.max(z.abs())))
    }

    // ------------------------------------------------------------------------
    // Ownership
    // ------------------------------------------------------------------------

    /// Set owner and occupant together; `None` clears both
    pub fn set_owner(&mut self, id: TileId, owner: Option<PlayerId>) {
        if let Some(tile) = self.get_mut(id) {
            tile.owner = owner;
            tile.occupant = owner;
        }
    }

    pub(crate) fn set_occupant(&mut self, id: TileId, occupant: Option<PlayerId>) {
        if let Some(tile) = self.get_mut(id) {
            tile.occupant = occupant;
        }
    }

    pub fn set_landmark(&mut self, id: TileId, landmark: bool) {
        if let Some(tile) = self.get_mut(id) {
            tile.landmark = landmark;
        }
    }

    // ------------------------------------------------------------------------
    // Entity stacks
    // ------------------------------------------------------------------------

    /// Push onto the tile's stack; false when full or stale
    pub fn push_entity(&mut self, id: TileId, entity: EntityId) -> bool {
        match self.get_mut(id) {
            Some(tile) if tile.entities.len() < MAX_ENTITIES_PER_TILE => {
                tile.entities.push(entity);
                true
            }
            _ => false,
        }
    }

    pub fn pop_entity(&mut self, id: TileId) -> Option<EntityId> {
        self.get_mut(id)?.entities.pop()
    }

    /// Remove a specific entity from anywhere in the stack
    pub fn take_entity(&mut self, id: TileId, entity: EntityId) -> bool {
        let Some(tile) = self.get_mut(id) else {
            return false;
        };
        match tile.entities.iter().rposition(|e| *e == entity) {
            Some(i) => {
                tile.entities.remove(i);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Facilities
    // ------------------------------------------------------------------------

    /// Attach a facility to a settlement; false when no slot is left
    pub fn add_facility(&mut self, settlement: TileId, facility: TileId) -> bool {
        let Some(parent) = self.get(settlement) else {
            return false;
        };
        if !self.contains(facility) {
            return false;
        }
        if parent.facilities.contains(&facility) {
            return true;
        }
        if parent.facilities.len() >= parent.def().max_facilities {
            return false;
        }
        self.detach_facility(facility);
        if let Some(parent) = self.get_mut(settlement) {
            parent.facilities.push(facility);
        }
        if let Some(f) = self.get_mut(facility) {
            f.controlled_by = Some(settlement);
        }
        true
    }

    pub fn remove_facility(&mut self, settlement: TileId, facility: TileId) {
        if let Some(parent) = self.get_mut(settlement) {
            parent.facilities.retain(|f| *f != facility);
        }
        if let Some(f) = self.get_mut(facility) {
            if f.controlled_by == Some(settlement) {
                f.controlled_by = None;
            }
        }
    }

    /// Detach a facility from whichever settlement controls it
    pub fn detach_facility(&mut self, facility: TileId) {
        if let Some(parent) = self.get(facility).and_then(|f| f.controlled_by) {
            self.remove_facility(parent, facility);
        }
    }

    // ------------------------------------------------------------------------
    // Roads
    // ------------------------------------------------------------------------

    pub fn set_road(&mut self, id: TileId, road: bool) {
        let Some(tile) = self.get_mut(id) else {
            return;
        };
        tile.road = road;
        let hex = tile.hex;
        self.refresh_road_links(id);
        self.refresh_neighbor_links(hex);
    }

    /// Recompute which directions show a road link
    pub fn refresh_road_links(&mut self, id: TileId) {
        let Some(tile) = self.get(id) else {
            return;
        };
        let mut links = 0u8;
        if tile.road {
            for d in Direction::ALL {
                let linked = self
                    .tile_at(tile.hex.neighbor(d))
                    .is_some_and(|n| n.road || n.def().connects_to_road);
                if linked {
                    links |= 1 << d.index();
                }
            }
        }
        if let Some(tile) = self.get_mut(id) {
            tile.road_links = links;
        }
    }

    fn refresh_neighbor_links(&mut self, hex: Hex) {
        for neighbor in self.neighbors_at(hex) {
            self.refresh_road_links(neighbor);
        }
    }
}

impl Index<TileId> for TileGraph {
    type Output = TileInstance;

    fn index(&self, id: TileId) -> &TileInstance {
        match self.get(id) {
            Some(tile) => tile,
            None => panic!("stale tile handle {id:?}"),
        }
    }
}
