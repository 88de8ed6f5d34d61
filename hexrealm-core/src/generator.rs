//! Procedural world generation
//!
//! Phases run strictly in order and share one seeded RNG, so a seed string
//! and a player count always reproduce the same layout. Drawing helpers work
//! on hex positions because tile handles go stale as soon as a tile is
//! painted over.

use crate::board::{Direction, Hex, TILE_DIAMETER, TILE_HEIGHT};
use crate::catalog::{TileKindId, ACCESSIBLE, BLOCKING, NATURAL};
use crate::config::{GenerationConfig, MAX_PLAYERS};
use crate::error::WorldError;
use crate::graph::{TileGraph, TileId};
use crate::pathfinder::find_path;
use crate::player::{PlayerId, PlayerState};
use crate::realm::update_realms;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Chance that a land-growing step stops early
const LAND_BREAK_PROBABILITY: f32 = 0.1;

/// Share of canvas tiles painted by a feature disk
const FEATURE_DENSITY: f32 = 0.33;

const FOREST_LINE: i32 = 5;
const LAKE_LINE: i32 = 3;
const MOUNTAIN_LINE: i32 = 5;

/// Hops between a settlement and its guaranteed mountain
const SPAWN_MOUNTAIN_DISTANCE: i32 = 3;

/// Camera anchor offset (x, y, z) from a player's settlement
const CAMERA_OFFSET: (f64, f64, f64) = (0.0, 5.0, -4.0);

/// Ambient kinds that receive landmarks and their minimum spacing
const LANDMARKS: [(TileKindId, u32); 3] = [
    (TileKindId::Ocean, 4),
    (TileKindId::Forest, 5),
    (TileKindId::Mountain, 4),
];

// ============================================================================
// SEEDS
// ============================================================================

/// Hash a seed string into the RNG seed
pub fn seed_from_string(seed: &str) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    hasher.finish()
}

/// Random 8-digit seed string (digits 0..=8) drawn from OS entropy
pub fn random_seed_string() -> String {
    let mut rng = rand::thread_rng();
    (0..8).map(|_| char::from(b'0' + rng.gen_range(0..9u8))).collect()
}

// ============================================================================
// GENERATOR
// ============================================================================

/// Result of a generation run
#[derive(Clone, Debug)]
pub struct GeneratedWorld {
    pub graph: TileGraph,
    /// Seed string the world was generated from
    pub seed: String,
    /// Settlement position of each player, by player index
    pub spawns: Vec<Hex>,
}

pub struct WorldGenerator<'a> {
    config: &'a GenerationConfig,
    rng: ChaCha8Rng,
    graph: TileGraph,
    spawns: Vec<Hex>,
}

impl<'a> WorldGenerator<'a> {
    /// Generate a world for `players`, seeding their capacity and camera anchor
    pub fn generate(
        config: &'a GenerationConfig,
        players: &mut [PlayerState],
    ) -> Result<GeneratedWorld, WorldError> {
        let count = players.len();
        if count == 0 || count > MAX_PLAYERS {
            return Err(WorldError::InvalidPlayerCount { count, max: MAX_PLAYERS });
        }
        let seed = match &config.seed {
            Some(s) if !s.is_empty() => s.clone(),
            _ => random_seed_string(),
        };
        let numeric = seed_from_string(&seed);
        info!(%seed, players = count, size = config.size, "generating world");

        let mut generator = WorldGenerator {
            config,
            rng: ChaCha8Rng::seed_from_u64(numeric),
            graph: TileGraph::new(numeric),
            spawns: Vec::with_capacity(count),
        };
        let n = count as u32;

        generator.create_continent(count)?;
        generator.create_forests(n * config.forest_count)?;
        generator.create_lakes(n * config.lake_count)?;
        generator.create_mountains(n * config.mountain_count)?;
        generator.create_ocean()?;
        generator.clear_paths()?;
        generator.prepare_spawn_areas(players)?;
        generator.clear_paths()?;
        update_realms(&mut generator.graph);
        for (kind, distance) in LANDMARKS {
            generator.place_landmarks(kind, distance);
        }

        info!(%seed, tiles = generator.graph.len(), "world generated");
        Ok(GeneratedWorld {
            graph: generator.graph,
            seed,
            spawns: generator.spawns,
        })
    }

    // ------------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------------

    fn create_continent(&mut self, players: usize) -> Result<(), WorldError> {
        self.graph.create(TileKindId::Empty, Hex::ORIGIN)?;
        let origin = Direction::random(&mut self.rng);
        let directions = Direction::spread(players, origin);
        let length = self.config.size / 4 + (players as f64).powf(1.5).round() as i32;

        let mut paths = Vec::new();
        for direction in directions {
            let line = self.squiggly_line(
                Hex::ORIGIN,
                TileKindId::Empty,
                &[TileKindId::Ocean, TileKindId::Empty],
                direction,
                length,
            )?;
            let end = match line.last() {
                Some(hex) => self.graph.at(*hex),
                None => {
                    warn!(?direction, "spawn line blocked, settling on last tile");
                    self.graph.last()
                }
            };
            let end = end.ok_or(WorldError::MissingTile(Hex::ORIGIN))?;
            let settlement = self.graph.replace(end, TileKindId::Settlement)?;
            self.spawns.push(self.graph[settlement].hex());
            paths.extend(line);
        }
        update_realms(&mut self.graph);

        for hex in paths {
            let radius = self.rng.gen_range(1..20);
            self.draw_land(hex, TileKindId::Empty, radius, LAND_BREAK_PROBABILITY)?;
        }
        debug!(tiles = self.graph.len(), "continent drawn");
        Ok(())
    }

    fn create_forests(&mut self, count: u32) -> Result<(), WorldError> {
        let canvas = [TileKindId::Empty, TileKindId::Forest];
        for _ in 0..=count {
            // Starts come from the live empty bucket, which shrinks as forests grow
            let empties = self.graph.all(TileKindId::Empty);
            if empties.is_empty() {
                break;
            }
            let start = empties[self.rng.gen_range(0..empties.len())];
            let start = self.graph[start].hex();
            let direction = Direction::random(&mut self.rng);
            let line = self.squiggly_line(start, TileKindId::Forest, &canvas, direction, FOREST_LINE)?;
            for hex in line {
                let radius = self.rng.gen_range(0..=2);
                self.draw_circle(hex, TileKindId::Forest, &canvas, radius, FEATURE_DENSITY)?;
            }
        }
        debug!(forests = self.graph.count(TileKindId::Forest), "forests drawn");
        Ok(())
    }

    fn create_lakes(&mut self, count: u32) -> Result<(), WorldError> {
        let canvas = [TileKindId::Empty, TileKindId::Forest, TileKindId::Lake];
        self.create_features(count, TileKindId::Lake, &canvas, LAKE_LINE)?;
        debug!(lakes = self.graph.count(TileKindId::Lake), "lakes drawn");
        Ok(())
    }

    fn create_mountains(&mut self, count: u32) -> Result<(), WorldError> {
        let canvas = [TileKindId::Empty, TileKindId::Forest, TileKindId::Mountain];
        self.create_features(count, TileKindId::Mountain, &canvas, MOUNTAIN_LINE)?;
        debug!(mountains = self.graph.count(TileKindId::Mountain), "mountains drawn");
        Ok(())
    }

    /// Lines of thin disks started from a snapshot of the canvas tiles
    fn create_features(
        &mut self,
        count: u32,
        paint: TileKindId,
        canvas: &[TileKindId],
        line_length: i32,
    ) -> Result<(), WorldError> {
        let starts: Vec<Hex> = self
            .graph
            .all_of(canvas)
            .into_iter()
            .map(|id| self.graph[id].hex())
            .collect();
        if starts.is_empty() {
            return Ok(());
        }
        for _ in 0..=count {
            let start = starts[self.rng.gen_range(0..starts.len())];
            let direction = Direction::random(&mut self.rng);
            let line = self.squiggly_line(start, paint, canvas, direction, line_length)?;
            for hex in line {
                let radius = self.rng.gen_range(0..2);
                self.draw_circle(hex, paint, canvas, radius, FEATURE_DENSITY)?;
            }
        }
        Ok(())
    }

    /// Surround the land with shallow ocean, then a deep ocean band
    fn create_ocean(&mut self) -> Result<(), WorldError> {
        let size = self.config.size;
        let extended = size + self.config.deep_ocean_margin;
        let existing: Vec<Hex> = self.graph.iter().map(|(_, t)| t.hex()).collect();

        let mut queue = VecDeque::new();
        for hex in existing {
            for d in Direction::ALL {
                let next = hex.neighbor(d);
                if self.graph.at(next).is_none() {
                    self.graph.create(TileKindId::Ocean, next)?;
                    queue.push_back(next);
                }
            }
        }

        while let Some(hex) = queue.pop_front() {
            for d in Direction::ALL {
                let next = hex.neighbor(d);
                if self.graph.at(next).is_some() {
                    continue;
                }
                let (x, z) = next.to_world();
                let kind = if within_window(x, z, size) {
                    TileKindId::Ocean
                } else if within_window(x, z, extended) {
                    TileKindId::DeepOcean
                } else {
                    continue;
                };
                self.graph.create(kind, next)?;
                queue.push_back(next);
            }
        }
        debug!(
            ocean = self.graph.count(TileKindId::Ocean),
            deep = self.graph.count(TileKindId::DeepOcean),
            "ocean drawn"
        );
        Ok(())
    }

    /// Guarantee an accessible route between consecutive spawns
    fn clear_paths(&mut self) -> Result<(), WorldError> {
        let repair_kinds: Vec<TileKindId> = ACCESSIBLE.iter().chain(BLOCKING).copied().collect();
        for pair in self.spawns.clone().windows(2) {
            let (Some(a), Some(b)) = (self.graph.at(pair[0]), self.graph.at(pair[1])) else {
                warn!(?pair, "spawn missing while clearing paths");
                continue;
            };
            if !find_path(&self.graph, a, b, ACCESSIBLE).is_empty() {
                continue;
            }
            let path: Vec<Hex> = find_path(&self.graph, a, b, &repair_kinds)
                .into_iter()
                .map(|id| self.graph[id].hex())
                .collect();
            if path.is_empty() {
                warn!(from = ?pair[0], to = ?pair[1], "no repairable path between spawns");
                continue;
            }
            let mut repaired = 0;
            for hex in path {
                let Some(id) = self.graph.at(hex) else { continue };
                if !self.graph[id].kind().is_blocking() {
                    continue;
                }
                let (mut forests, mut empties) = (0, 0);
                for n in self.graph.neighbors(id) {
                    match self.graph[n].kind() {
                        TileKindId::Forest => forests += 1,
                        TileKindId::Empty => empties += 1,
                        _ => {}
                    }
                }
                let paint = if forests > empties { TileKindId::Forest } else { TileKindId::Empty };
                self.graph.replace(id, paint)?;
                repaired += 1;
            }
            debug!(from = ?pair[0], to = ?pair[1], repaired, "path forced open");
        }
        Ok(())
    }

    /// Give every player a woodcutter, a field and a nearby mountain
    fn prepare_spawn_areas(&mut self, players: &mut [PlayerState]) -> Result<(), WorldError> {
        for (index, player) in players.iter_mut().enumerate() {
            let owner = Some(PlayerId(index));
            let spawn = self.spawns[index];
            let directions = Direction::spread(2, Direction::random(&mut self.rng));
            let forest_hex = spawn.neighbor(directions[0]);
            let empty_hex = spawn.neighbor(directions[1]);
            self.draw_circle(forest_hex, TileKindId::Forest, NATURAL, 1, 1.0)?;
            self.draw_circle(empty_hex, TileKindId::Empty, NATURAL, 1, 1.0)?;

            let settlement = self.tile(spawn)?;
            let forest = self.tile(forest_hex)?;
            let woodcutter = self.graph.replace(forest, TileKindId::Woodcutter)?;
            self.graph.set_owner(woodcutter, owner);
            self.graph.add_facility(settlement, woodcutter);

            let mountain_direction = Direction::random(&mut self.rng);
            for hop in 1..SPAWN_MOUNTAIN_DISTANCE {
                let hex = spawn.step(mountain_direction, hop);
                match self.graph.at(hex) {
                    Some(id) if self.graph[id].kind().is_water() => {
                        self.graph.replace(id, TileKindId::Empty)?;
                    }
                    Some(_) => {}
                    None => {
                        self.graph.create(TileKindId::Empty, hex)?;
                    }
                }
            }
            let peak = spawn.step(mountain_direction, SPAWN_MOUNTAIN_DISTANCE);
            match self.graph.at(peak) {
                Some(id) if !self.graph[id].kind().is_structure() => {
                    self.graph.replace(id, TileKindId::Mountain)?;
                }
                Some(_) => {}
                None => {
                    self.graph.create(TileKindId::Mountain, peak)?;
                }
            }

            let [prev, next] = directions[1].near();
            let candidates = [prev, next, directions[1]];
            let field_hex = spawn.neighbor(candidates[self.rng.gen_range(0..candidates.len())]);
            let field = self.tile(field_hex)?;
            let field = self.graph.replace(field, TileKindId::Field)?;
            self.graph.set_owner(field, owner);
            self.graph.add_facility(settlement, field);

            self.graph.set_owner(settlement, owner);
            self.graph.set_landmark(settlement, true);
            self.graph.refresh_road_links(settlement);
            player
                .inventory
                .add_capacities(TileKindId::Settlement.kind().storage);
            let (x, z) = spawn.to_world();
            player.camera_anchor = (x + CAMERA_OFFSET.0, CAMERA_OFFSET.1, z + CAMERA_OFFSET.2);
            debug!(player = %player.id, ?spawn, "spawn area prepared");
        }
        Ok(())
    }

    /// Mark ambient tiles on a shore of their kind, spaced `distance` apart
    fn place_landmarks(&mut self, kind: TileKindId, distance: u32) {
        if !kind.kind().ambient {
            return;
        }
        let mut placed = 0;
        for id in self.graph.all(kind).to_vec() {
            let on_edge = self
                .graph
                .neighbors(id)
                .iter()
                .any(|n| self.graph[*n].kind() != kind);
            if !on_edge {
                continue;
            }
            let area = self.graph.area(id, distance, &[]);
            let crowded = area.iter().any(|t| self.graph[*t].is_landmark());
            let open_sea = area.iter().all(|t| self.graph[*t].kind().is_water());
            if !crowded && !open_sea {
                self.graph.set_landmark(id, true);
                placed += 1;
            }
        }
        debug!(%kind, placed, "landmarks placed");
    }

    // ------------------------------------------------------------------------
    // Drawing helpers
    // ------------------------------------------------------------------------

    fn tile(&self, hex: Hex) -> Result<TileId, WorldError> {
        self.graph.at(hex).ok_or(WorldError::MissingTile(hex))
    }

    /// Create the tile at `hex` or paint over the existing one
    fn paint(&mut self, hex: Hex, paint: TileKindId) -> Result<TileId, WorldError> {
        match self.graph.at(hex) {
            Some(id) => self.graph.replace(id, paint),
            None => self.graph.create(paint, hex),
        }
    }

    /// Randomized walk that steps to either side of `direction`
    fn squiggly_line(
        &mut self,
        start: Hex,
        paint: TileKindId,
        canvas: &[TileKindId],
        direction: Direction,
        length: i32,
    ) -> Result<Vec<Hex>, WorldError> {
        let sides = direction.near();
        let mut line = Vec::new();
        let mut current = start;
        for _ in 0..length {
            let step = sides[self.rng.gen_range(0..sides.len())];
            let next = current.neighbor(step);
            match self.graph.at(next) {
                None => {
                    self.graph.create(paint, next)?;
                }
                Some(id) if canvas.contains(&self.graph[id].kind()) && !line.contains(&next) => {
                    self.graph.replace(id, paint)?;
                }
                Some(_) => break,
            }
            line.push(next);
            current = next;
        }
        Ok(line)
    }

    /// Paint missing neighbors always and canvas neighbors with `density` chance
    fn draw_neighbors(
        &mut self,
        tiles: &[Hex],
        paint: TileKindId,
        canvas: &[TileKindId],
        density: f32,
    ) -> Result<Vec<Hex>, WorldError> {
        let mut drawn = Vec::new();
        for hex in tiles {
            for d in Direction::ALL {
                let next = hex.neighbor(d);
                match self.graph.at(next) {
                    None => {
                        self.graph.create(paint, next)?;
                        drawn.push(next);
                    }
                    Some(id) => {
                        if canvas.contains(&self.graph[id].kind()) && self.rng.gen::<f32>() <= density {
                            self.graph.replace(id, paint)?;
                            drawn.push(next);
                        }
                    }
                }
            }
        }
        Ok(drawn)
    }

    /// Hexagonal disk; the center is painted regardless of the canvas
    fn draw_circle(
        &mut self,
        center: Hex,
        paint: TileKindId,
        canvas: &[TileKindId],
        radius: u32,
        density: f32,
    ) -> Result<(), WorldError> {
        self.paint(center, paint)?;
        let mut ring = vec![center];
        for _ in 0..radius {
            ring = self.draw_neighbors(&ring, paint, canvas, density)?;
        }
        Ok(())
    }

    /// Grow land outward, turning water and empty positions into `paint`.
    ///
    /// Depth-first like the recursive formulation: each tile's children are
    /// pushed in reverse so they pop in direction order.
    fn draw_land(
        &mut self,
        origin: Hex,
        paint: TileKindId,
        radius: i32,
        break_probability: f32,
    ) -> Result<(), WorldError> {
        let mut stack = vec![(origin, radius)];
        while let Some((hex, radius)) = stack.pop() {
            let radius = radius - 1;
            if self.rng.gen::<f32>() <= break_probability {
                continue;
            }
            let mut drawn = Vec::new();
            for d in Direction::ALL {
                let next = hex.neighbor(d);
                match self.graph.at(next) {
                    None => {
                        self.graph.create(paint, next)?;
                        drawn.push(next);
                    }
                    Some(id) if self.graph[id].kind().is_water() => {
                        self.graph.replace(id, paint)?;
                        drawn.push(next);
                    }
                    Some(_) => {}
                }
            }
            if radius > 0 {
                stack.extend(drawn.into_iter().rev().map(|h| (h, radius)));
            }
        }
        Ok(())
    }
}

/// Rectangular ocean window of `size` tiles, in world units
fn within_window(x: f64, z: f64, size: i32) -> bool {
    let span = f64::from(size - 1);
    (x * 2.0).abs() <= TILE_DIAMETER * span && (z * 2.0).abs() <= TILE_HEIGHT * span
}
