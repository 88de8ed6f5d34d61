//! Tile and entity kind definitions

use crate::inventory::Resources;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tile kind identifier (index into TILE_KINDS)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKindId {
    Empty = 0,
    Forest = 1,
    Mountain = 2,
    Lake = 3,
    Ocean = 4,
    DeepOcean = 5,
    Ruins = 6,
    Settlement = 7,
    Village = 8,
    City = 9,
    Field = 10,
    Woodcutter = 11,
    Mine = 12,
    Quarry = 13,
    Barracks = 14,
}

pub const KIND_COUNT: usize = 15;

/// Entity kind identifier (index into ENTITY_KINDS)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKindId {
    Soldier = 0,
}

/// Category tag bitmasks
pub const TAG_NATURAL: u8 = 1 << 0;   // Naturally generated
pub const TAG_WATER: u8 = 1 << 1;
pub const TAG_ACCESSIBLE: u8 = 1 << 2; // Reachable by players
pub const TAG_STRUCTURE: u8 = 1 << 3;  // Built by players

/// Kind groups
pub const NATURAL: &[TileKindId] = &[
    TileKindId::Lake,
    TileKindId::Ocean,
    TileKindId::DeepOcean,
    TileKindId::Empty,
    TileKindId::Forest,
    TileKindId::Mountain,
];
pub const WATER: &[TileKindId] = &[TileKindId::Lake, TileKindId::Ocean, TileKindId::DeepOcean];
pub const BLOCKING: &[TileKindId] = &[
    TileKindId::Lake,
    TileKindId::Ocean,
    TileKindId::DeepOcean,
    TileKindId::Mountain,
];
pub const ACCESSIBLE: &[TileKindId] = &[
    TileKindId::Empty,
    TileKindId::Forest,
    TileKindId::Ruins,
    TileKindId::Settlement,
    TileKindId::Village,
    TileKindId::City,
    TileKindId::Field,
];
/// Realm-projecting kinds, in realm pass order
pub const OWNABLE: &[TileKindId] = &[TileKindId::Settlement, TileKindId::Village, TileKindId::City];

/// Immutable template of a terrain or structure tile
#[derive(Clone, Debug)]
pub struct TileKind {
    pub id: TileKindId,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tags: u8,
    pub selectable: bool,
    /// Units cannot stand here unless it is a road or an enemy structure under attack
    pub obstructed: bool,
    pub connects_to_road: bool,
    pub occupy_radius: u32,
    pub max_facilities: usize,
    /// Carried entities needed to enter or destroy the tile
    pub health_points: usize,
    pub construction_score: i32,
    pub destruction_score: i32,
    pub storage: Resources,
    pub production: Resources,
    pub consumption: Resources,
    pub cost: Resources,
    pub built_on: &'static [TileKindId],
    pub next_to: &'static [TileKindId],
    pub destroyed: Option<TileKindId>,
    pub upgrade: Option<TileKindId>,
    pub produces: Option<EntityKindId>,
    /// May carry a landmark marker
    pub ambient: bool,
}

impl TileKind {
    const fn new(
        id: TileKindId,
        name: &'static str,
        title: &'static str,
        description: &'static str,
        tags: u8,
    ) -> Self {
        Self {
            id,
            name,
            title,
            description,
            tags,
            selectable: true,
            obstructed: false,
            connects_to_road: false,
            occupy_radius: 0,
            max_facilities: 0,
            health_points: 1,
            construction_score: 0,
            destruction_score: 0,
            storage: Resources::ZERO,
            production: Resources::ZERO,
            consumption: Resources::ZERO,
            cost: Resources::ZERO,
            built_on: &[],
            next_to: &[],
            destroyed: None,
            upgrade: None,
            produces: None,
            ambient: false,
        }
    }

    pub fn is(&self, tag: u8) -> bool {
        self.tags & tag != 0
    }
}

const LAND: u8 = TAG_NATURAL | TAG_ACCESSIBLE;
const SEA: u8 = TAG_NATURAL | TAG_WATER;
const TOWN: u8 = TAG_STRUCTURE | TAG_ACCESSIBLE;

/// All tile kinds, indexed by TileKindId
pub static TILE_KINDS: [TileKind; KIND_COUNT] = [
    // Terrain
    TileKind::new(TileKindId::Empty, "empty", "Grassland", "Open land, ready to be settled.", LAND),
    TileKind {
        ambient: true,
        ..TileKind::new(TileKindId::Forest, "forest", "Forest", "Dense woods. Woodcutters can be built here.", LAND)
    },
    TileKind {
        obstructed: true,
        health_points: 99,
        ambient: true,
        ..TileKind::new(TileKindId::Mountain, "mountain", "Mountain", "Impassable peaks rich in iron and stone.", TAG_NATURAL)
    },
    TileKind {
        selectable: false,
        obstructed: true,
        health_points: 99,
        ..TileKind::new(TileKindId::Lake, "waterLake", "Lake", "Fresh water.", SEA)
    },
    TileKind {
        selectable: false,
        obstructed: true,
        health_points: 99,
        ambient: true,
        ..TileKind::new(TileKindId::Ocean, "waterOcean", "Ocean", "Shallow coastal water.", SEA)
    },
    TileKind {
        selectable: false,
        obstructed: true,
        health_points: 99,
        ..TileKind::new(TileKindId::DeepOcean, "waterOceanDeep", "Deep Ocean", "The edge of the world.", SEA)
    },
    TileKind::new(TileKindId::Ruins, "ruins", "Ruins", "What is left of a fallen settlement.", TAG_ACCESSIBLE),
    // Settlements
    TileKind {
        connects_to_road: true,
        occupy_radius: 2,
        max_facilities: 3,
        health_points: 3,
        construction_score: 5,
        destruction_score: 10,
        storage: Resources::new(200, 200, 100, 100),
        cost: Resources::new(50, 50, 0, 20),
        built_on: &[TileKindId::Empty, TileKindId::Forest, TileKindId::Ruins],
        destroyed: Some(TileKindId::Ruins),
        upgrade: Some(TileKindId::Village),
        ambient: true,
        ..TileKind::new(TileKindId::Settlement, "settlement", "Settlement", "A small settlement claiming the land around it.", TOWN)
    },
    TileKind {
        connects_to_road: true,
        occupy_radius: 3,
        max_facilities: 4,
        health_points: 5,
        construction_score: 10,
        destruction_score: 20,
        storage: Resources::new(400, 400, 200, 200),
        cost: Resources::new(100, 100, 0, 50),
        built_on: &[TileKindId::Settlement],
        destroyed: Some(TileKindId::Ruins),
        upgrade: Some(TileKindId::City),
        ..TileKind::new(TileKindId::Village, "village", "Village", "A growing village with more room for facilities.", TOWN)
    },
    TileKind {
        connects_to_road: true,
        occupy_radius: 4,
        max_facilities: 6,
        health_points: 8,
        construction_score: 20,
        destruction_score: 40,
        storage: Resources::new(800, 800, 400, 400),
        cost: Resources::new(200, 200, 50, 100),
        built_on: &[TileKindId::Village],
        destroyed: Some(TileKindId::Ruins),
        ..TileKind::new(TileKindId::City, "city", "City", "A fortified city.", TOWN)
    },
    // Facilities
    TileKind {
        construction_score: 1,
        destruction_score: 2,
        production: Resources::new(15, 0, 0, 0),
        cost: Resources::new(0, 20, 0, 0),
        built_on: &[TileKindId::Empty],
        destroyed: Some(TileKindId::Empty),
        ..TileKind::new(TileKindId::Field, "field", "Field", "Produces food every round.", TOWN)
    },
    TileKind {
        obstructed: true,
        health_points: 2,
        construction_score: 2,
        destruction_score: 4,
        production: Resources::new(0, 10, 0, 0),
        consumption: Resources::new(2, 0, 0, 0),
        cost: Resources::new(10, 10, 0, 0),
        built_on: &[TileKindId::Forest],
        destroyed: Some(TileKindId::Forest),
        ..TileKind::new(TileKindId::Woodcutter, "woodcutter", "Woodcutter", "Produces wood every round.", TAG_STRUCTURE)
    },
    TileKind {
        obstructed: true,
        health_points: 2,
        construction_score: 3,
        destruction_score: 6,
        production: Resources::new(0, 0, 5, 0),
        consumption: Resources::new(3, 0, 0, 0),
        cost: Resources::new(0, 30, 0, 0),
        built_on: &[TileKindId::Empty, TileKindId::Forest],
        next_to: &[TileKindId::Mountain],
        destroyed: Some(TileKindId::Empty),
        ..TileKind::new(TileKindId::Mine, "mine", "Mine", "Produces iron. Must be next to a mountain.", TAG_STRUCTURE)
    },
    TileKind {
        obstructed: true,
        health_points: 2,
        construction_score: 3,
        destruction_score: 6,
        production: Resources::new(0, 0, 0, 5),
        consumption: Resources::new(3, 0, 0, 0),
        cost: Resources::new(0, 30, 0, 0),
        built_on: &[TileKindId::Empty, TileKindId::Forest],
        next_to: &[TileKindId::Mountain],
        destroyed: Some(TileKindId::Empty),
        ..TileKind::new(TileKindId::Quarry, "quarry", "Quarry", "Produces stone. Must be next to a mountain.", TAG_STRUCTURE)
    },
    TileKind {
        obstructed: true,
        health_points: 3,
        construction_score: 5,
        destruction_score: 10,
        consumption: Resources::new(5, 0, 0, 0),
        cost: Resources::new(0, 50, 10, 30),
        built_on: &[TileKindId::Empty],
        destroyed: Some(TileKindId::Ruins),
        produces: Some(EntityKindId::Soldier),
        ..TileKind::new(TileKindId::Barracks, "barracks", "Barracks", "Trains soldiers.", TAG_STRUCTURE)
    },
];

/// Immutable template of a unit
#[derive(Clone, Debug)]
pub struct EntityKind {
    pub id: EntityKindId,
    pub name: &'static str,
    pub build_cost: Resources,
    pub movement_cost: Resources,
}

pub static ENTITY_KINDS: [EntityKind; 1] = [EntityKind {
    id: EntityKindId::Soldier,
    name: "soldier",
    build_cost: Resources::new(20, 0, 5, 0),
    movement_cost: Resources::new(2, 0, 0, 0),
}];

impl TileKindId {
    pub const ALL: [TileKindId; KIND_COUNT] = [
        TileKindId::Empty,
        TileKindId::Forest,
        TileKindId::Mountain,
        TileKindId::Lake,
        TileKindId::Ocean,
        TileKindId::DeepOcean,
        TileKindId::Ruins,
        TileKindId::Settlement,
        TileKindId::Village,
        TileKindId::City,
        TileKindId::Field,
        TileKindId::Woodcutter,
        TileKindId::Mine,
        TileKindId::Quarry,
        TileKindId::Barracks,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn kind(self) -> &'static TileKind {
        &TILE_KINDS[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.kind().name
    }

    pub fn is_water(self) -> bool {
        self.kind().is(TAG_WATER)
    }

    pub fn is_natural(self) -> bool {
        self.kind().is(TAG_NATURAL)
    }

    pub fn is_accessible(self) -> bool {
        self.kind().is(TAG_ACCESSIBLE)
    }

    pub fn is_structure(self) -> bool {
        self.kind().is(TAG_STRUCTURE)
    }

    pub fn is_ownable(self) -> bool {
        OWNABLE.contains(&self)
    }

    pub fn is_blocking(self) -> bool {
        BLOCKING.contains(&self)
    }

    /// Structure attached to a settlement
    pub fn is_facility(self) -> bool {
        self.is_structure() && !self.is_ownable()
    }

    pub fn is_factory(self) -> bool {
        self.kind().produces.is_some()
    }
}

impl fmt::Display for TileKindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl EntityKindId {
    pub fn kind(self) -> &'static EntityKind {
        &ENTITY_KINDS[self as usize]
    }
}

/// Get tile kind definition by ID
pub fn get_tile_kind(id: TileKindId) -> &'static TileKind {
    id.kind()
}

/// Look up a tile kind by its catalog name
pub fn tile_kind_by_name(name: &str) -> Option<TileKindId> {
    TILE_KINDS.iter().find(|k| k.name == name).map(|k| k.id)
}
