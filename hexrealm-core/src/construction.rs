//! Settlement menus: facilities, upgrades, new settlements and roads

use crate::catalog::TileKindId;
use crate::error::ActionError;
use crate::events::GameEvent;
use crate::game::Game;
use crate::graph::TileId;
use crate::inventory::Resource;
use crate::player::PlayerId;
use tracing::debug;

/// Stone spent per road segment
pub const ROAD_COST: i32 = 1;

impl Game {
    // ========================================================================
    // FACILITIES
    // ========================================================================

    /// Check whether `settlement` may put a `kind` facility on `target`
    /// without changing anything
    pub fn validate_facility(
        &self,
        player: PlayerId,
        settlement: TileId,
        target: TileId,
        kind: TileKindId,
    ) -> Result<(), ActionError> {
        self.ensure_turn(player)?;
        let s = self.graph.get(settlement).ok_or(ActionError::StaleTile(settlement))?;
        if !s.kind().is_ownable() || s.owner() != Some(player) {
            return Err(ActionError::NotOwner);
        }
        if !kind.is_facility() {
            return Err(ActionError::BuildRestricted(kind));
        }
        let t = self.graph.get(target).ok_or(ActionError::StaleTile(target))?;
        if !self.graph.are_neighbors(settlement, target) {
            return Err(ActionError::NotAdjacent);
        }
        if t.occupant() != Some(player) {
            return Err(ActionError::NotOccupied);
        }
        let def = kind.kind();
        let rebuild = t.controlled_by() == Some(settlement);
        if t.controlled_by().is_some() && !rebuild {
            return Err(ActionError::BuildRestricted(kind));
        }
        if !def.built_on.contains(&t.kind()) {
            return Err(ActionError::BuildRestricted(kind));
        }
        if !def.next_to.is_empty() {
            let found = self
                .graph
                .neighbors(target)
                .into_iter()
                .any(|n| def.next_to.contains(&self.graph[n].kind()));
            if !found {
                return Err(ActionError::BuildRestricted(kind));
            }
        }
        if t.is_road() && !def.connects_to_road {
            return Err(ActionError::BuildRestricted(kind));
        }
        if s.has_entities() && t.def().obstructed {
            return Err(ActionError::Obstructed);
        }
        if !rebuild && s.facilities().len() >= s.def().max_facilities {
            return Err(ActionError::FacilityLimit);
        }
        if !self.players[player.index()].inventory.has(&def.cost) {
            return Err(ActionError::InsufficientResources);
        }
        Ok(())
    }

    /// Build a facility next to one of the player's settlements
    pub fn build_facility(
        &mut self,
        player: PlayerId,
        settlement: TileId,
        target: TileId,
        kind: TileKindId,
    ) -> Result<TileId, ActionError> {
        let result = self
            .validate_facility(player, settlement, target, kind)
            .and_then(|_| self.build(player, target, kind));
        if let Ok(facility) = &result {
            self.graph.add_facility(settlement, *facility);
        }
        self.report(player, result)
    }

    // ========================================================================
    // SETTLEMENTS
    // ========================================================================

    /// Upgrade settlement → village → city, keeping attached facilities
    pub fn upgrade_settlement(
        &mut self,
        player: PlayerId,
        settlement: TileId,
    ) -> Result<TileId, ActionError> {
        let result = self
            .validate_upgrade(player, settlement)
            .and_then(|upgrade| self.build(player, settlement, upgrade));
        self.report(player, result)
    }

    /// Next tier for `settlement`, if the player can afford it now
    pub fn validate_upgrade(
        &self,
        player: PlayerId,
        settlement: TileId,
    ) -> Result<TileKindId, ActionError> {
        self.ensure_turn(player)?;
        let s = self.graph.get(settlement).ok_or(ActionError::StaleTile(settlement))?;
        if s.owner() != Some(player) || !s.kind().is_ownable() {
            return Err(ActionError::NotOwner);
        }
        let upgrade = s.def().upgrade.ok_or(ActionError::NotUpgradable)?;
        if !self.players[player.index()].inventory.has(&upgrade.kind().cost) {
            return Err(ActionError::InsufficientResources);
        }
        Ok(upgrade)
    }

    /// Found a new settlement inside the player's realm. Facilities left
    /// behind by a settlement that stood on these ruins are taken over.
    pub fn found_settlement(&mut self, player: PlayerId, target: TileId) -> Result<TileId, ActionError> {
        let result = self
            .validate_settlement(player, target)
            .and_then(|_| {
                let former = self.graph[target].former_facilities().to_vec();
                self.build(player, target, TileKindId::Settlement).map(|s| (s, former))
            })
            .map(|(settlement, former)| {
                for hex in former {
                    let Some(facility) = self.graph.at(hex) else {
                        continue;
                    };
                    let f = &self.graph[facility];
                    let free = f.kind().is_facility()
                        && f.controlled_by().is_none()
                        && f.owner().map_or(true, |o| o == player);
                    if free && self.graph.add_facility(settlement, facility) {
                        self.graph.set_owner(facility, Some(player));
                        debug!(%player, ?hex, "facility re-adopted");
                    }
                }
                if let Some(s) = self.graph.get_mut(settlement) {
                    s.former_facilities.clear();
                }
                settlement
            });
        self.report(player, result)
    }

    pub fn validate_settlement(&self, player: PlayerId, target: TileId) -> Result<(), ActionError> {
        self.ensure_turn(player)?;
        let t = self.graph.get(target).ok_or(ActionError::StaleTile(target))?;
        let def = TileKindId::Settlement.kind();
        if t.occupant() != Some(player) {
            return Err(ActionError::NotOccupied);
        }
        if !def.built_on.contains(&t.kind()) || t.controlled_by().is_some() {
            return Err(ActionError::BuildRestricted(TileKindId::Settlement));
        }
        let crowded = self.graph.neighbors(target).into_iter().any(|n| {
            let neighbor = &self.graph[n];
            neighbor.kind().is_structure() && !t.former_facilities().contains(&neighbor.hex())
        });
        if crowded {
            return Err(ActionError::BuildRestricted(TileKindId::Settlement));
        }
        if !self.players[player.index()].inventory.has(&def.cost) {
            return Err(ActionError::InsufficientResources);
        }
        Ok(())
    }

    // ========================================================================
    // ROADS
    // ========================================================================

    pub fn build_road(&mut self, player: PlayerId, target: TileId) -> Result<(), ActionError> {
        let result = self.ensure_turn(player).and_then(|_| {
            let t = self.graph.get(target).ok_or(ActionError::StaleTile(target))?;
            if t.is_road() {
                return Err(ActionError::AlreadyRoad);
            }
            if t.occupant() != Some(player) {
                return Err(ActionError::NotOccupied);
            }
            if !t.kind().is_accessible() || t.kind().is_ownable() {
                return Err(ActionError::BuildRestricted(t.kind()));
            }
            let hex = t.hex();
            if !self.players[player.index()].inventory.take(ROAD_COST, Resource::Stone) {
                return Err(ActionError::InsufficientResources);
            }
            self.graph.set_road(target, true);
            debug!(%player, ?hex, "road built");
            self.publish(GameEvent::RoadBuilt { player, at: hex });
            self.publish(GameEvent::InventoryChanged { player });
            Ok(())
        });
        self.report(player, result)
    }

    // ========================================================================
    // SHARED
    // ========================================================================

    /// Pay for and put up `kind` on `target`, then refresh realms
    fn build(&mut self, player: PlayerId, target: TileId, kind: TileKindId) -> Result<TileId, ActionError> {
        let def = kind.kind();
        let replaced = self.graph.get(target).ok_or(ActionError::StaleTile(target))?.def();
        if !self.players[player.index()].inventory.take_all(&def.cost) {
            return Err(ActionError::InsufficientResources);
        }
        let built = self
            .graph
            .replace(target, kind)
            .map_err(|_| ActionError::StaleTile(target))?;
        self.graph.set_owner(built, Some(player));

        let at = self.graph[built].hex();
        let state = self.player_mut(player);
        state.score += def.construction_score;
        state.inventory.add_capacities(def.storage - replaced.storage);
        debug!(%player, ?at, %kind, score = state.score, "tile built");

        self.publish(GameEvent::TileBuilt { player, at, kind });
        self.publish(GameEvent::InventoryChanged { player });
        self.publish(GameEvent::CapacityChanged { player });
        self.refresh_realms();
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Hex;
    use crate::game::{GameResult, Rules};
    use crate::graph::TileGraph;
    use crate::player::PlayerState;

    /// Settlement at the origin surrounded by two rings of grassland, a
    /// forest to the north and a mountain beyond the north-east neighbor
    fn homestead(rules: Rules) -> Game {
        let mut graph = TileGraph::new(6);
        for q in -3..=3 {
            for r in -3..=3 {
                let hex = Hex::new(q, r);
                if hex.distance_to(Hex::ORIGIN) <= 3 {
                    graph.create(TileKindId::Empty, hex).unwrap();
                }
            }
        }
        let swap = |graph: &mut TileGraph, hex: Hex, kind| {
            let id = graph.at(hex).unwrap();
            graph.replace(id, kind).unwrap()
        };
        swap(&mut graph, Hex::new(1, 0), TileKindId::Forest);
        swap(&mut graph, Hex::new(0, 2), TileKindId::Mountain);
        let s = swap(&mut graph, Hex::ORIGIN, TileKindId::Settlement);
        graph.set_owner(s, Some(PlayerId(0)));
        crate::realm::update_realms(&mut graph);

        let players = vec![
            PlayerState::new(PlayerId(0), "builder", "#0f0"),
            PlayerState::new(PlayerId(1), "idle", "#f00"),
        ];
        let mut game = Game::from_parts(graph, players, rules, 3).unwrap();
        game.start();
        if game.current_player() != PlayerId(0) {
            game.done(PlayerId(1)).unwrap();
        }
        game
    }

    fn settlement(game: &Game) -> TileId {
        game.graph().at(Hex::ORIGIN).unwrap()
    }

    fn at(game: &Game, q: i32, r: i32) -> TileId {
        game.graph().at(Hex::new(q, r)).unwrap()
    }

    const ME: PlayerId = PlayerId(0);

    #[test]
    fn test_build_woodcutter_on_forest() {
        let mut game = homestead(Rules::default());
        let wood = game.player(ME).unwrap().inventory.amount(Resource::Wood);
        let built = game
            .build_facility(ME, settlement(&game), at(&game, 1, 0), TileKindId::Woodcutter)
            .unwrap();
        let tile = &game.graph()[built];
        assert_eq!(tile.kind(), TileKindId::Woodcutter);
        assert_eq!(tile.owner(), Some(ME));
        assert_eq!(tile.controlled_by(), Some(settlement(&game)));
        assert_eq!(game.player(ME).unwrap().score, 2);
        assert_eq!(game.player(ME).unwrap().inventory.amount(Resource::Wood), wood - 10);
    }

    #[test]
    fn test_facility_placement_rules() {
        let mut game = homestead(Rules::default());
        let s = settlement(&game);
        // Woodcutters need forest
        assert_eq!(
            game.build_facility(ME, s, at(&game, -1, 0), TileKindId::Woodcutter),
            Err(ActionError::BuildRestricted(TileKindId::Woodcutter))
        );
        // Mines need a mountain neighbor: (0,1) touches (0,2), (-1,0) does not
        assert!(game.validate_facility(ME, s, at(&game, 0, 1), TileKindId::Mine).is_ok());
        assert_eq!(
            game.validate_facility(ME, s, at(&game, -1, 0), TileKindId::Mine),
            Err(ActionError::BuildRestricted(TileKindId::Mine))
        );
        // Not adjacent to the settlement
        assert_eq!(
            game.validate_facility(ME, s, at(&game, 2, 0), TileKindId::Field),
            Err(ActionError::NotAdjacent)
        );
        // Settlements are not facilities
        assert_eq!(
            game.validate_facility(ME, s, at(&game, -1, 0), TileKindId::Settlement),
            Err(ActionError::BuildRestricted(TileKindId::Settlement))
        );
    }

    #[test]
    fn test_facility_limit() {
        let rules = Rules { winning_score: 100, starting_resources: 200 };
        let mut game = homestead(rules);
        let s = settlement(&game);
        for (q, r) in [(-1, 0), (-1, 1), (0, -1)] {
            game.build_facility(ME, s, at(&game, q, r), TileKindId::Field).unwrap();
        }
        assert_eq!(game.graph()[s].facilities().len(), 3);
        assert_eq!(
            game.build_facility(ME, s, at(&game, 1, -1), TileKindId::Field),
            Err(ActionError::FacilityLimit)
        );
    }

    #[test]
    fn test_upgrade_carries_facilities_and_capacity() {
        let rules = Rules { winning_score: 100, starting_resources: 200 };
        let mut game = homestead(rules);
        let s = settlement(&game);
        game.build_facility(ME, s, at(&game, -1, 0), TileKindId::Field).unwrap();
        let village = game.upgrade_settlement(ME, s).unwrap();
        let tile = &game.graph()[village];
        assert_eq!(tile.kind(), TileKindId::Village);
        assert_eq!(tile.facilities().len(), 1);
        assert_eq!(game.graph()[at(&game, -1, 0)].controlled_by(), Some(village));
        assert_eq!(
            game.player(ME).unwrap().inventory.capacities(),
            TileKindId::Village.kind().storage
        );
        // The realm grows with the new radius
        let edge = game.graph().tile_at(Hex::new(3, 0)).unwrap();
        assert_eq!(edge.occupant(), Some(ME));
        assert!(game.graph().get(s).is_none());
    }

    #[test]
    fn test_city_cannot_upgrade() {
        let rules = Rules { winning_score: 1000, starting_resources: 1000 };
        let mut game = homestead(rules);
        // Starting stock is clamped to settlement storage; top it up per tier
        let village = game.upgrade_settlement(ME, settlement(&game)).unwrap();
        let storage = TileKindId::Village.kind().storage;
        game.player_mut(ME).inventory.give_all(&storage);
        let city = game.upgrade_settlement(ME, village).unwrap();
        assert_eq!(game.upgrade_settlement(ME, city), Err(ActionError::NotUpgradable));
    }

    #[test]
    fn test_found_settlement_needs_space() {
        let mut game = homestead(Rules::default());
        assert_eq!(
            game.found_settlement(ME, at(&game, 1, -1)),
            Err(ActionError::BuildRestricted(TileKindId::Settlement))
        );
        // (2,-1) is inside the realm and two hops from the settlement
        let s = game.found_settlement(ME, at(&game, 2, -1)).unwrap();
        assert_eq!(game.graph()[s].owner(), Some(ME));
        assert_eq!(game.player(ME).unwrap().score, 5);
    }

    #[test]
    fn test_found_outside_realm_rejected() {
        let mut game = homestead(Rules::default());
        assert_eq!(game.found_settlement(ME, at(&game, 3, 0)), Err(ActionError::NotOccupied));
    }

    #[test]
    fn test_roads() {
        let mut game = homestead(Rules::default());
        let tile = at(&game, -1, 0);
        let stone = game.player(ME).unwrap().inventory.amount(Resource::Stone);
        game.build_road(ME, tile).unwrap();
        assert!(game.graph()[tile].is_road());
        // The settlement next door connects
        assert_ne!(game.graph()[tile].road_links(), 0);
        assert_eq!(game.player(ME).unwrap().inventory.amount(Resource::Stone), stone - ROAD_COST);
        assert_eq!(game.build_road(ME, tile), Err(ActionError::AlreadyRoad));
        assert_eq!(game.build_road(ME, settlement(&game)), Err(ActionError::BuildRestricted(TileKindId::Settlement)));
    }

    #[test]
    fn test_build_can_win() {
        let rules = Rules { winning_score: 5, starting_resources: 100 };
        let mut game = homestead(rules);
        game.found_settlement(ME, at(&game, 2, -1)).unwrap();
        assert_eq!(game.result(), GameResult::Won(ME));
    }

    #[test]
    fn test_rejections_publish_cue() {
        use std::cell::Cell;
        use std::rc::Rc;
        let mut game = homestead(Rules::default());
        let rejected = Rc::new(Cell::new(0));
        let counter = Rc::clone(&rejected);
        game.subscribe(move |e| {
            if matches!(e, GameEvent::ActionRejected { .. }) {
                counter.set(counter.get() + 1);
            }
        });
        let _ = game.build_road(ME, at(&game, 3, 0));
        let _ = game.found_settlement(PlayerId(1), at(&game, 2, -1));
        assert_eq!(rejected.get(), 2);
    }
}
