//! Breadth-first pathfinding over the tile graph

use crate::catalog::TileKindId;
use crate::graph::{TileGraph, TileId};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Shortest path from `origin` to `target`, both inclusive.
///
/// Only tiles whose kind is in `allowed` are entered (an empty slice allows
/// everything); the origin itself is never filtered. Returns `[origin]` when
/// both ends coincide and an empty path when the target is unreachable.
pub fn find_path(
    graph: &TileGraph,
    origin: TileId,
    target: TileId,
    allowed: &[TileKindId],
) -> Vec<TileId> {
    if !graph.contains(origin) || !graph.contains(target) {
        return Vec::new();
    }

    let mut came_from: FxHashMap<TileId, Option<TileId>> = FxHashMap::default();
    let mut frontier = VecDeque::from([origin]);
    came_from.insert(origin, None);

    while let Some(current) = frontier.pop_front() {
        if current == target {
            let mut path = vec![current];
            let mut step = current;
            while let Some(Some(prev)) = came_from.get(&step) {
                path.push(*prev);
                step = *prev;
            }
            path.reverse();
            return path;
        }
        for next in graph.neighbors(current) {
            if came_from.contains_key(&next) {
                continue;
            }
            if !allowed.is_empty() && !allowed.contains(&graph[next].kind()) {
                continue;
            }
            came_from.insert(next, Some(current));
            frontier.push_back(next);
        }
    }
    Vec::new()
}
