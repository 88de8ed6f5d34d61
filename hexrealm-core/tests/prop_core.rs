//! Property-based tests for the world model.
//!
//! Covers inventory bounds, direction algebra, adjacency and the
//! transactional tile replacement.

use hexrealm_core::{
    find_path, Direction, EntityId, EntityKindId, EntityStore, GenerationConfig, Hex, Inventory,
    PlayerId, PlayerState, Resource, TileGraph, TileKindId, WorldGenerator, WorldSummary,
};
use proptest::prelude::*;
use std::collections::HashSet;

/// All hexes within `radius` of the origin
fn disk(radius: i32) -> Vec<Hex> {
    let mut hexes = Vec::new();
    for q in -radius..=radius {
        for r in -radius..=radius {
            let hex = Hex::new(q, r);
            if hex.distance_to(Hex::ORIGIN) <= radius {
                hexes.push(hex);
            }
        }
    }
    hexes
}

#[derive(Clone, Debug)]
enum InventoryOp {
    Give(i32),
    Take(i32),
    Capacity(i32),
}

fn inventory_op() -> impl Strategy<Value = (InventoryOp, usize)> {
    let op = prop_oneof![
        (-50i32..200).prop_map(InventoryOp::Give),
        (-50i32..200).prop_map(InventoryOp::Take),
        (-300i32..300).prop_map(InventoryOp::Capacity),
    ];
    (op, 0usize..4)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Balances stay within [0, capacity] whatever happens
    #[test]
    fn prop_inventory_bounded(ops in prop::collection::vec(inventory_op(), 1..60)) {
        let mut inventory = Inventory::new();
        for (op, r) in ops {
            let resource = Resource::ALL[r];
            match op {
                InventoryOp::Give(n) => { inventory.give(n, resource); }
                InventoryOp::Take(n) => { inventory.take(n, resource); }
                InventoryOp::Capacity(n) => inventory.add_capacity(n, resource),
            }
            for resource in Resource::ALL {
                prop_assert!(inventory.capacity(resource) >= 0);
                prop_assert!(inventory.amount(resource) >= 0);
                prop_assert!(inventory.amount(resource) <= inventory.capacity(resource));
            }
        }
    }

    /// A successful take is undone exactly by giving the same amount back
    #[test]
    fn prop_take_then_give_restores(capacity in 0i32..500, stock in 0i32..500, amount in 0i32..600) {
        let mut inventory = Inventory::new();
        inventory.add_capacity(capacity, Resource::Iron);
        inventory.give(stock, Resource::Iron);
        let before = inventory.clone();
        if inventory.take(amount, Resource::Iron) {
            inventory.give(amount, Resource::Iron);
            prop_assert_eq!(inventory, before);
        } else {
            prop_assert!(amount > before.amount(Resource::Iron));
            prop_assert_eq!(inventory, before);
        }
    }

    /// Direction offsets form the cyclic group of order six
    #[test]
    fn prop_direction_algebra(d in 0i32..6, a in -20i32..20, b in -20i32..20) {
        let dir = Direction::from_index(d);
        prop_assert_eq!(dir.offset(a).offset(b), dir.offset(a + b));
        prop_assert_eq!(dir.offset(a).offset(-a), dir);
        prop_assert_eq!(Hex::ORIGIN.neighbor(dir).neighbor(dir.opposite()), Hex::ORIGIN);
        prop_assert_eq!(Hex::ORIGIN.direction_to(Hex::ORIGIN.neighbor(dir)), Some(dir));
    }

    /// Spread returns the requested number of distinct directions
    #[test]
    fn prop_spread_distinct(count in 0usize..10, d in 0i32..6) {
        let origin = Direction::from_index(d);
        let spread = Direction::spread(count, origin);
        prop_assert_eq!(spread.len(), count.min(6));
        let unique: HashSet<_> = spread.iter().collect();
        prop_assert_eq!(unique.len(), spread.len());
        if count > 0 && 6 % count == 0 {
            prop_assert_eq!(spread[0], origin);
        }
    }

    /// Adjacency is symmetric and matches hex distance one
    #[test]
    fn prop_adjacency_symmetric(holes in prop::collection::vec(0usize..37, 0..12)) {
        let hexes = disk(3);
        let mut graph = TileGraph::new(0);
        for (i, hex) in hexes.iter().enumerate() {
            if !holes.contains(&i) {
                graph.create(TileKindId::Empty, *hex).unwrap();
            }
        }
        let ids: Vec<_> = graph.iter().map(|(id, _)| id).collect();
        for a in &ids {
            for b in &ids {
                let adjacent = graph.are_neighbors(*a, *b);
                prop_assert_eq!(adjacent, graph.are_neighbors(*b, *a));
                prop_assert_eq!(adjacent, graph[*a].hex().distance_to(graph[*b].hex()) == 1);
            }
            for n in graph.neighbors(*a) {
                prop_assert!(graph.neighbors(n).contains(a));
            }
        }
    }

    /// Unfiltered paths on a full disk are shortest and contiguous
    #[test]
    fn prop_path_is_shortest(from in 0usize..61, to in 0usize..61) {
        let hexes = disk(4);
        let mut graph = TileGraph::new(0);
        for hex in &hexes {
            graph.create(TileKindId::Empty, *hex).unwrap();
        }
        let a = graph.at(hexes[from]).unwrap();
        let b = graph.at(hexes[to]).unwrap();
        let path = find_path(&graph, a, b, &[]);
        prop_assert_eq!(path.len() as i32 - 1, hexes[from].distance_to(hexes[to]));
        prop_assert_eq!(path.first(), Some(&a));
        prop_assert_eq!(path.last(), Some(&b));
        prop_assert!(path.windows(2).all(|w| graph.are_neighbors(w[0], w[1])));
    }

    /// Replacing a tile keeps its stack and relations and retires the handle
    #[test]
    fn prop_replace_transactional(stack in 0usize..5, kind in 0usize..15, road in any::<bool>()) {
        let mut graph = TileGraph::new(1);
        let mut store = EntityStore::new();
        let center = graph.create(TileKindId::Settlement, Hex::ORIGIN).unwrap();
        let side = graph.create(TileKindId::Field, Hex::new(1, 0)).unwrap();
        graph.set_owner(center, Some(PlayerId(0)));
        graph.add_facility(center, side);
        graph.set_road(center, road);
        let pushed: Vec<EntityId> = (0..stack)
            .map(|_| store.spawn(EntityKindId::Soldier, PlayerId(0)))
            .filter(|e| graph.push_entity(center, *e))
            .collect();

        let new_kind = TileKindId::ALL[kind];
        let before = graph.count(new_kind);
        let replaced = graph.replace(center, new_kind).unwrap();

        prop_assert!(graph.get(center).is_none());
        prop_assert_eq!(graph.at(Hex::ORIGIN), Some(replaced));
        let tile = &graph[replaced];
        prop_assert_eq!(tile.entities(), pushed.as_slice());
        prop_assert_eq!(tile.facilities(), &[side][..]);
        prop_assert_eq!(tile.is_road(), road);
        prop_assert_eq!(tile.owner(), None);
        prop_assert_eq!(graph[side].controlled_by(), Some(replaced));
        prop_assert!(graph.all(new_kind).contains(&replaced));
        let expected = if new_kind == TileKindId::Settlement { before } else { before + 1 };
        prop_assert_eq!(graph.count(new_kind), expected);
        prop_assert_eq!(graph.len(), 2);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    /// Any seed yields a closed world whose spawns are mutually reachable
    #[test]
    fn prop_generated_worlds_connected(seed in "[0-8]{8}", players in 1usize..5) {
        let config = GenerationConfig {
            size: 24,
            forest_count: 6,
            mountain_count: 3,
            lake_count: 2,
            seed: Some(seed.clone()),
            deep_ocean_margin: 4,
        };
        let mut states: Vec<PlayerState> = (0..players)
            .map(|i| PlayerState::new(PlayerId(i), format!("p{i}"), "#000"))
            .collect();
        let world = WorldGenerator::generate(&config, &mut states).unwrap();
        let summary = WorldSummary::new(&world.graph, &world.seed, &world.spawns);
        prop_assert_eq!(&summary.seed, &seed);
        prop_assert_eq!(world.spawns.len(), players);
        prop_assert!(summary.spawns_connected());
        prop_assert_eq!(summary.count(TileKindId::Settlement), players);
    }
}
