//! Realm propagation: which player's influence each tile lies under

use crate::catalog::OWNABLE;
use crate::graph::{TileGraph, TileId};
use crate::player::PlayerId;
use tracing::debug;

/// Recompute every tile's occupant from ownership.
///
/// Occupants start out equal to owners. Each ownable tile then claims its
/// area in bucket order; an unowned ownable tile clears its area, and a tile
/// that already has an occupant is never overwritten by a later claim.
pub fn update_realms(graph: &mut TileGraph) {
    let tiles: Vec<(TileId, Option<PlayerId>)> =
        graph.iter().map(|(id, t)| (id, t.owner())).collect();
    for (id, owner) in tiles {
        graph.set_occupant(id, owner);
    }

    let mut claimed = 0usize;
    for ownable in graph.all_of(OWNABLE) {
        let tile = &graph[ownable];
        let owner = tile.owner();
        let area = graph.area(ownable, tile.def().occupy_radius, &[]);
        for target in area {
            match owner {
                None => graph.set_occupant(target, None),
                Some(owner) => {
                    let t = &graph[target];
                    if t.occupant().is_none() && t.owner().map_or(true, |o| o == owner) {
                        graph.set_occupant(target, Some(owner));
                        claimed += 1;
                    }
                }
            }
        }
    }
    debug!(claimed, "realms updated");
}

/// Tiles currently in a player's realm
pub fn realm_of(graph: &TileGraph, player: PlayerId) -> Vec<TileId> {
    graph
        .iter()
        .filter(|(_, t)| t.occupant() == Some(player))
        .map(|(id, _)| id)
        .collect()
}

/// True while the player still owns a settlement, village or city
pub fn holds_ownable(graph: &TileGraph, player: PlayerId) -> bool {
    graph
        .all_of(OWNABLE)
        .into_iter()
        .any(|id| graph[id].owner() == Some(player))
}
