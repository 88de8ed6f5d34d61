//! Serializable digest of a generated world

use crate::board::Hex;
use crate::catalog::{TileKindId, ACCESSIBLE};
use crate::graph::TileGraph;
use crate::pathfinder::find_path;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorldSummary {
    pub seed: String,
    pub tiles: usize,
    /// Tile count per kind name; kinds that never occur are omitted
    pub kinds: BTreeMap<&'static str, usize>,
    pub spawns: Vec<Hex>,
    /// Walkable path length between consecutive spawns (None: cut off)
    pub spawn_paths: Vec<Option<usize>>,
    /// Largest world-space |x| and |z|
    pub bounds: (f64, f64),
    pub landmarks: usize,
}

impl WorldSummary {
    pub fn new(graph: &TileGraph, seed: &str, spawns: &[Hex]) -> Self {
        let kinds = TileKindId::ALL
            .iter()
            .filter(|k| graph.count(**k) > 0)
            .map(|k| (k.name(), graph.count(*k)))
            .collect();
        let spawn_paths = spawns
            .windows(2)
            .map(|pair| {
                let (a, b) = (graph.at(pair[0])?, graph.at(pair[1])?);
                let path = find_path(graph, a, b, ACCESSIBLE);
                (!path.is_empty()).then(|| path.len() - 1)
            })
            .collect();
        Self {
            seed: seed.to_string(),
            tiles: graph.len(),
            kinds,
            spawns: spawns.to_vec(),
            spawn_paths,
            bounds: graph.bounds(),
            landmarks: graph.iter().filter(|(_, t)| t.is_landmark()).count(),
        }
    }

    pub fn count(&self, kind: TileKindId) -> usize {
        self.kinds.get(kind.name()).copied().unwrap_or(0)
    }

    /// True when every pair of consecutive spawns is connected
    pub fn spawns_connected(&self) -> bool {
        self.spawn_paths.iter().all(Option::is_some)
    }
}
