//! Hex grid geometry with axial coordinates and the six-direction algebra

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Tile diameter in world units
pub const TILE_DIAMETER: f64 = 1.0;

/// Tile height in world units (diameter * sin 60°)
pub const TILE_HEIGHT: f64 = TILE_DIAMETER * 0.866_025_403_784_438_6;

/// Axial hex coordinates
///
/// The basis is `q` along North and `r` along NorthEast, so every
/// direction vector below is a small integer pair and adjacency is exact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const ORIGIN: Hex = Hex::new(0, 0);

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Get neighbor in direction
    pub fn neighbor(&self, direction: Direction) -> Hex {
        let (dq, dr) = direction.vector();
        Hex::new(self.q + dq, self.r + dr)
    }

    /// Walk `steps` tiles in one direction
    pub fn step(&self, direction: Direction, steps: i32) -> Hex {
        let (dq, dr) = direction.vector();
        Hex::new(self.q + dq * steps, self.r + dr * steps)
    }

    /// Direction leading from this hex to an adjacent one
    pub fn direction_to(&self, other: Hex) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| self.neighbor(*d) == other)
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: Hex) -> i32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        (dq + dr + ds) / 2
    }

    /// World-space position (x, z) of the tile center
    pub fn to_world(&self) -> (f64, f64) {
        let x = TILE_HEIGHT * (f64::from(self.q) + f64::from(self.r) / 2.0);
        let z = 0.75 * TILE_DIAMETER * f64::from(self.r);
        (x, z)
    }
}

/// Direction vectors in axial coordinates (dq, dr)
/// Index: 0=N, 1=NE, 2=SE, 3=S, 4=SW, 5=NW
pub const DIRECTIONS: [(i32, i32); 6] = [
    (1, 0),   // N
    (0, 1),   // NE
    (-1, 1),  // SE
    (-1, 0),  // S
    (0, -1),  // SW
    (1, -1),  // NW
];

/// One of the six neighbor directions of a flat-topped hex, clockwise from north
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    SouthEast = 2,
    South = 3,
    SouthWest = 4,
    NorthWest = 5,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for any integer index, wrapping modulo 6
    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(6) as usize]
    }

    /// Axial offset of the neighbor in this direction
    pub fn vector(self) -> (i32, i32) {
        DIRECTIONS[self.index()]
    }

    /// World-space offset (x, z) of the neighbor in this direction
    pub fn world_vector(self) -> (f64, f64) {
        Hex::ORIGIN.neighbor(self).to_world()
    }

    /// Rotation of this direction relative to north, in degrees
    pub fn angle_degrees(self) -> f32 {
        self.index() as f32 * -60.0
    }

    /// Direction `offset` positions away, clockwise
    pub fn offset(self, offset: i32) -> Self {
        Self::from_index(self as i32 + offset)
    }

    pub fn opposite(self) -> Self {
        self.offset(3)
    }

    /// Next direction clockwise
    pub fn next(self) -> Self {
        self.offset(1)
    }

    /// Previous direction (counter-clockwise)
    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    /// The first `size` directions starting at this one: clockwise for a
    /// positive size, counter-clockwise for a negative one. Clamped to six.
    pub fn range(self, size: i32) -> Vec<Direction> {
        let size = size.clamp(-6, 6);
        let step = size.signum();
        (0..size.abs()).map(|i| self.offset(i * step)).collect()
    }

    /// The two neighboring directions (previous, next)
    pub fn near(self) -> [Direction; 2] {
        [self.prev(), self.next()]
    }

    /// The two neighboring directions and their outer neighbors
    pub fn far(self) -> [Direction; 4] {
        [self.offset(-2), self.offset(-1), self.offset(1), self.offset(2)]
    }

    /// `count` directions spread approximately evenly, starting at `origin`.
    ///
    /// Counts that divide six are placed at equal steps; four and five are
    /// built by leaving out the complementary evenly spaced set.
    pub fn spread(count: usize, origin: Direction) -> Vec<Direction> {
        if count == 0 {
            return Vec::new();
        }
        let count = count.min(6);
        if 6 % count != 0 {
            let skipped = 6 - count;
            Self::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| i % (6 / skipped) != 0)
                .map(|(_, d)| d.offset(origin as i32 - 1))
                .collect()
        } else {
            Self::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| i % (6 / count) == 0)
                .map(|(_, d)| d.offset(origin as i32))
                .collect()
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..6)]
    }
}
