//! Entity carry protocol: grab, place (with combat) and cancel
//!
//! A player picks entities up from one tile (or a factory), carries at most
//! [`MAX_CARRIED`] and puts them down on an adjacent tile. Placing onto enemy
//! entities resolves combat; placing onto an enemy structure destroys it.

use crate::error::ActionError;
use crate::events::GameEvent;
use crate::game::Game;
use crate::graph::{TileId, MAX_ENTITIES_PER_TILE};
use crate::inventory::Resources;
use crate::player::{PlayerId, MAX_CARRIED};
use crate::realm::holds_ownable;
use rand::Rng;
use tracing::{debug, info, warn};

impl Game {
    // ========================================================================
    // GRAB
    // ========================================================================

    /// Pick up one entity from `tile`, or spawn one when it is an attached
    /// factory owned by the player
    pub fn grab_entity(&mut self, player: PlayerId, tile: TileId) -> Result<(), ActionError> {
        let result = self.ensure_turn(player).and_then(|_| self.try_grab(player, tile));
        self.report(player, result)
    }

    fn try_grab(&mut self, player: PlayerId, tile: TileId) -> Result<(), ActionError> {
        let t = self.graph.get(tile).ok_or(ActionError::StaleTile(tile))?;
        let hex = t.hex();
        let state = &self.players[player.index()];
        if state.entity_source.is_some_and(|source| source != hex) {
            return Err(ActionError::SourceMismatch);
        }
        if state.hand.len() >= MAX_CARRIED {
            return Err(ActionError::HandFull);
        }

        if let (Some(produces), Some(owner)) = (t.def().produces, t.owner()) {
            if owner == player {
                if t.controlled_by().is_none() {
                    return Err(ActionError::NothingToGrab);
                }
                let cost = produces.kind().build_cost;
                let state = &mut self.players[player.index()];
                if !state.inventory.take_all(&cost) {
                    return Err(ActionError::InsufficientResources);
                }
                let entity = self.entities.spawn(produces, player);
                state.hand.push(entity);
                state.entity_source = Some(hex);
                debug!(%player, ?hex, carried = state.hand.len(), "entity spawned");
                self.publish(GameEvent::InventoryChanged { player });
                self.publish(GameEvent::EntitiesChanged { player });
                return Ok(());
            }
        }

        let top = t.top_entity().ok_or(ActionError::NothingToGrab)?;
        if self.entities.owner(top) != Some(player) {
            return Err(ActionError::NotOwner);
        }
        let entity = t
            .entities()
            .iter()
            .rev()
            .copied()
            .find(|e| self.entities.get(*e).is_some_and(|e| !e.moved))
            .ok_or(ActionError::NothingToGrab)?;
        let cost = self
            .entities
            .get(entity)
            .map(|e| e.kind().movement_cost)
            .unwrap_or(Resources::ZERO);
        if !self.players[player.index()].inventory.take_all(&cost) {
            return Err(ActionError::InsufficientResources);
        }
        self.graph.take_entity(tile, entity);
        let state = &mut self.players[player.index()];
        state.hand.push(entity);
        state.entity_source = Some(hex);
        debug!(%player, ?hex, carried = state.hand.len(), "entity grabbed");
        self.publish(GameEvent::InventoryChanged { player });
        self.publish(GameEvent::EntitiesChanged { player });
        Ok(())
    }

    // ========================================================================
    // PLACE
    // ========================================================================

    /// Put the carried entities down on `target`, fighting whatever enemy
    /// entities or structure sit there
    pub fn place_entities(&mut self, player: PlayerId, target: TileId) -> Result<(), ActionError> {
        let result = self.ensure_turn(player).and_then(|_| self.try_place(player, target));
        self.report(player, result)
    }

    fn try_place(&mut self, player: PlayerId, target: TileId) -> Result<(), ActionError> {
        let state = &self.players[player.index()];
        let carried = state.hand.len();
        if carried == 0 {
            return Err(ActionError::EmptyHand);
        }
        let t = self.graph.get(target).ok_or(ActionError::StaleTile(target))?;
        let def = t.def();
        if let Some(source) = state.entity_source {
            if source == t.hex() {
                self.return_hand(player);
                return Ok(());
            }
            if source.distance_to(t.hex()) != 1 {
                return Err(ActionError::NotAdjacent);
            }
        }
        if def.obstructed && !t.is_road() && t.owner().map_or(true, |o| o == player) {
            return Err(ActionError::Obstructed);
        }
        if def.health_points > carried {
            return Err(ActionError::TooWeak);
        }

        let mut target = target;
        let enemy_structure = t.kind().is_structure()
            && def.destroyed.is_some()
            && t.owner().is_some_and(|o| o != player);
        if enemy_structure {
            target = self.destroy_structure(player, target)?;
        }

        let mut defenders_lost = 0;
        while let Some(&attacker) = self.players[player.index()].hand.last() {
            let t = &self.graph[target];
            let stacked = t.entity_count();
            let defender = t
                .top_entity()
                .filter(|e| self.entities.owner(*e).is_some_and(|o| o != player));

            if let Some(defender) = defender {
                let even = stacked == self.players[player.index()].hand.len();
                let defender_falls = !even || self.rng.gen::<f32>() >= 0.5;
                if defender_falls {
                    self.graph.pop_entity(target);
                    self.entities.destroy(defender);
                    self.players[player.index()].score += 1;
                    defenders_lost += 1;
                }
                if !even || !defender_falls {
                    self.players[player.index()].hand.pop();
                    self.entities.destroy(attacker);
                }
                continue;
            }

            if stacked >= MAX_ENTITIES_PER_TILE {
                break;
            }
            self.players[player.index()].hand.pop();
            self.graph.push_entity(target, attacker);
            self.entities.set_moved(attacker, true);
        }

        let state = &mut self.players[player.index()];
        if state.hand.is_empty() {
            state.entity_source = None;
        }
        debug!(
            %player,
            at = ?self.graph[target].hex(),
            defenders_lost,
            left = state.hand.len(),
            "entities placed"
        );
        self.check_winning_conditions();
        self.publish(GameEvent::PlayersChanged);
        self.publish(GameEvent::EntitiesChanged { player });
        Ok(())
    }

    /// Turn an enemy structure into its destroyed variant. Returns the new
    /// tile handle.
    fn destroy_structure(&mut self, attacker: PlayerId, tile: TileId) -> Result<TileId, ActionError> {
        let t = &self.graph[tile];
        let kind = t.kind();
        let def = t.def();
        let hex = t.hex();
        let (Some(enemy), Some(destroyed)) = (t.owner(), def.destroyed) else {
            return Ok(tile);
        };
        let facilities = t.facilities().to_vec();
        let former: Vec<_> = facilities.iter().map(|f| self.graph[*f].hex()).collect();

        self.players[attacker.index()].score += def.destruction_score;
        self.players[enemy.index()]
            .inventory
            .add_capacities(Resources::ZERO - def.storage);
        self.publish(GameEvent::CapacityChanged { player: enemy });
        self.publish(GameEvent::InventoryChanged { player: enemy });

        self.graph.detach_facility(tile);
        for facility in facilities {
            self.graph.remove_facility(tile, facility);
        }
        self.graph.set_owner(tile, None);
        let ruins = self
            .graph
            .replace(tile, destroyed)
            .map_err(|_| ActionError::StaleTile(tile))?;
        if let Some(r) = self.graph.get_mut(ruins) {
            r.former_facilities = former;
        }

        info!(%attacker, %enemy, ?hex, %kind, "structure destroyed");
        self.publish(GameEvent::TileDestroyed { by: attacker, at: hex, kind });
        self.refresh_realms();
        if !holds_ownable(&self.graph, enemy) {
            self.defeat(enemy);
        }
        Ok(ruins)
    }

    // ========================================================================
    // CANCEL
    // ========================================================================

    /// Undo the pick-up: refund costs and return entities where they came
    /// from
    pub fn cancel_entity_placement(&mut self, player: PlayerId) -> Result<(), ActionError> {
        let result = self.ensure_turn(player).and_then(|_| {
            if self.players[player.index()].carries_entities() {
                Ok(())
            } else {
                Err(ActionError::EmptyHand)
            }
        });
        if result.is_ok() {
            self.return_hand(player);
        }
        self.report(player, result)
    }

    /// Empty the hand back into the source. Spawned entities are refunded and
    /// destroyed; picked-up ones are refunded and pushed back in reverse
    /// pick-up order, which restores the source stack.
    pub(crate) fn return_hand(&mut self, player: PlayerId) {
        let state = &mut self.players[player.index()];
        let hand = std::mem::take(&mut state.hand);
        let source = state.entity_source.take().and_then(|hex| self.graph.at(hex));
        let from_factory = source.is_some_and(|s| self.graph[s].kind().is_factory());

        for entity in hand.into_iter().rev() {
            let Some(kind) = self.entities.get(entity).map(|e| e.kind()) else {
                continue;
            };
            let inventory = &mut self.players[player.index()].inventory;
            if from_factory {
                inventory.give_all(&kind.build_cost);
                self.entities.destroy(entity);
                continue;
            }
            inventory.give_all(&kind.movement_cost);
            let returned = source.is_some_and(|s| self.graph.push_entity(s, entity));
            if returned {
                self.entities.set_moved(entity, false);
            } else {
                warn!(%player, ?entity, "source tile cannot take entity back, dropping it");
                self.entities.destroy(entity);
            }
        }
        debug!(%player, from_factory, "placement cancelled");
        self.publish(GameEvent::InventoryChanged { player });
        self.publish(GameEvent::EntitiesChanged { player });
    }
}

#[cfg(test)]
mod tests {
    use crate::board::Hex;
    use crate::catalog::TileKindId;
    use crate::error::ActionError;
    use crate::game::{Game, GameResult, Rules};
    use crate::graph::{TileGraph, TileId};
    use crate::inventory::Resource;
    use crate::player::{PlayerId, PlayerState};

    /// Two settlements with attached barracks facing a shared row of empty
    /// tiles: P0 barracks at (1,0), P1 barracks at (3,0), battlefield (2,0).
    fn arena() -> Game {
        let mut graph = TileGraph::new(4);
        for q in -1..=5 {
            for r in -1..=1 {
                graph.create(TileKindId::Empty, Hex::new(q, r)).unwrap();
            }
        }
        for (player, settle_q, barracks_q) in [(0, -1, 1), (1, 5, 3)] {
            let s = graph.at(Hex::new(settle_q, 0)).unwrap();
            let s = graph.replace(s, TileKindId::Settlement).unwrap();
            let b = graph.at(Hex::new(barracks_q, 0)).unwrap();
            let b = graph.replace(b, TileKindId::Barracks).unwrap();
            graph.set_owner(s, Some(PlayerId(player)));
            graph.set_owner(b, Some(PlayerId(player)));
            assert!(graph.add_facility(s, b));
        }
        let players = (0..2)
            .map(|i| PlayerState::new(PlayerId(i), format!("p{i}"), "#fff"))
            .collect();
        let mut game = Game::from_parts(graph, players, Rules::default(), 77).unwrap();
        game.start();
        game
    }

    fn barracks_of(game: &Game, player: PlayerId) -> TileId {
        let q = if player == PlayerId(0) { 1 } else { 3 };
        game.graph().at(Hex::new(q, 0)).unwrap()
    }

    fn field(game: &Game) -> TileId {
        game.graph().at(Hex::new(2, 0)).unwrap()
    }

    fn owners_on(game: &Game, tile: TileId) -> Vec<PlayerId> {
        game.graph()[tile]
            .entities()
            .iter()
            .filter_map(|e| game.entities().owner(*e))
            .collect()
    }

    #[test]
    fn test_factory_grab_spends_build_cost() {
        let mut game = arena();
        let me = game.current_player();
        let before = game.player(me).unwrap().inventory.amounts();
        game.grab_entity(me, barracks_of(&game, me)).unwrap();
        let after = game.player(me).unwrap().inventory.amounts();
        assert_eq!(before - after, crate::catalog::EntityKindId::Soldier.kind().build_cost);
        assert_eq!(game.player(me).unwrap().carried_count(), 1);
    }

    #[test]
    fn test_hand_limit() {
        let mut game = arena();
        let me = game.current_player();
        let barracks = barracks_of(&game, me);
        for _ in 0..4 {
            game.grab_entity(me, barracks).unwrap();
        }
        assert_eq!(game.grab_entity(me, barracks), Err(ActionError::HandFull));
    }

    #[test]
    fn test_enemy_factory_is_not_a_source() {
        let mut game = arena();
        let me = game.current_player();
        let enemy = PlayerId(1 - me.index());
        assert_eq!(
            game.grab_entity(me, barracks_of(&game, enemy)),
            Err(ActionError::NothingToGrab)
        );
    }

    #[test]
    fn test_place_requires_adjacency() {
        let mut game = arena();
        let me = game.current_player();
        game.grab_entity(me, barracks_of(&game, me)).unwrap();
        let far = game.graph().at(Hex::new(if me == PlayerId(0) { 4 } else { 0 }, 1)).unwrap();
        assert_eq!(game.place_entities(me, far), Err(ActionError::NotAdjacent));
        assert_eq!(game.player(me).unwrap().carried_count(), 1);
    }

    #[test]
    fn test_place_marks_moved_and_blocks_regrab() {
        let mut game = arena();
        let me = game.current_player();
        game.grab_entity(me, barracks_of(&game, me)).unwrap();
        let target = field(&game);
        game.place_entities(me, target).unwrap();
        assert_eq!(owners_on(&game, target), vec![me]);
        assert!(game.player(me).unwrap().entity_source().is_none());
        assert_eq!(game.grab_entity(me, target), Err(ActionError::NothingToGrab));
    }

    #[test]
    fn test_cancel_factory_refunds_and_destroys() {
        let mut game = arena();
        let me = game.current_player();
        let before = game.player(me).unwrap().inventory.amounts();
        let barracks = barracks_of(&game, me);
        game.grab_entity(me, barracks).unwrap();
        game.grab_entity(me, barracks).unwrap();
        game.cancel_entity_placement(me).unwrap();
        assert_eq!(game.player(me).unwrap().inventory.amounts(), before);
        assert!(game.entities().is_empty());
        assert_eq!(game.cancel_entity_placement(me), Err(ActionError::EmptyHand));
    }

    #[test]
    fn test_cancel_returns_to_source_unmoved() {
        let mut game = arena();
        let me = game.current_player();
        let barracks = barracks_of(&game, me);
        game.grab_entity(me, barracks).unwrap();
        game.grab_entity(me, barracks).unwrap();
        let target = field(&game);
        game.place_entities(me, target).unwrap();
        // Next turn, pick both up again and put them back
        game.done(me).unwrap();
        let other = game.current_player();
        game.done(other).unwrap();
        let stack = game.graph()[target].entities().to_vec();
        let food = game.player(me).unwrap().inventory.amount(Resource::Food);
        game.grab_entity(me, target).unwrap();
        game.grab_entity(me, target).unwrap();
        assert!(!game.graph()[target].has_entities());
        game.place_entities(me, target).unwrap();
        assert_eq!(game.graph()[target].entities(), stack.as_slice());
        assert_eq!(game.player(me).unwrap().inventory.amount(Resource::Food), food);
        assert!(stack.iter().all(|e| !game.entities().get(*e).unwrap().moved));
    }

    #[test]
    fn test_done_cancels_carried_entities() {
        let mut game = arena();
        let me = game.current_player();
        game.grab_entity(me, barracks_of(&game, me)).unwrap();
        game.done(me).unwrap();
        assert_eq!(game.player(me).unwrap().carried_count(), 0);
        assert!(game.entities().is_empty());
    }

    #[test]
    fn test_even_combat_leaves_one_side() {
        let mut game = arena();
        let first = game.current_player();
        let second = PlayerId(1 - first.index());
        let target = field(&game);

        for _ in 0..2 {
            game.grab_entity(first, barracks_of(&game, first)).unwrap();
        }
        game.place_entities(first, target).unwrap();
        game.done(first).unwrap();

        let first_score = game.player(first).unwrap().score;
        for _ in 0..2 {
            game.grab_entity(second, barracks_of(&game, second)).unwrap();
        }
        game.place_entities(second, target).unwrap();

        let owners = owners_on(&game, target);
        assert_eq!(owners.len(), 1);
        let defenders_left = owners.iter().filter(|o| **o == first).count() as i32;
        assert_eq!(game.player(second).unwrap().score, 2 - defenders_left);
        assert_eq!(game.player(first).unwrap().score, first_score);
        assert_eq!(game.player(second).unwrap().carried_count(), 0);
    }

    #[test]
    fn test_destroying_last_settlement_defeats_owner() {
        let mut game = arena();
        let me = game.current_player();
        let enemy = PlayerId(1 - me.index());
        let enemy_settlement = game
            .owned_tiles(enemy)
            .into_iter()
            .find(|t| game.graph()[*t].kind() == TileKindId::Settlement)
            .unwrap();
        // Three soldiers already stand next to the enemy settlement
        let enemy_hex = game.graph()[enemy_settlement].hex();
        let staging = game
            .graph()
            .neighbors(enemy_settlement)
            .into_iter()
            .find(|t| game.graph()[*t].kind() == TileKindId::Empty)
            .unwrap();
        for _ in 0..3 {
            let id = game.entities.spawn(crate::catalog::EntityKindId::Soldier, me);
            game.graph.push_entity(staging, id);
        }
        let enemy_storage = TileKindId::Settlement.kind().storage;
        let capacity_before = game.player(enemy).unwrap().inventory.capacities();

        for _ in 0..3 {
            game.grab_entity(me, staging).unwrap();
        }
        let target = game.graph().at(enemy_hex).unwrap();
        game.place_entities(me, target).unwrap();

        let ruins = game.graph().tile_at(enemy_hex).unwrap();
        assert_eq!(ruins.kind(), TileKindId::Ruins);
        assert_eq!(ruins.owner(), None);
        assert_eq!(ruins.former_facilities().len(), 1);
        assert_eq!(ruins.entity_count(), 3);
        assert_eq!(
            game.player(me).unwrap().score,
            TileKindId::Settlement.kind().destruction_score
        );
        assert_eq!(
            game.player(enemy).unwrap().inventory.capacities(),
            capacity_before - enemy_storage
        );
        assert!(game.player(enemy).unwrap().defeated);
        assert_eq!(game.result(), GameResult::Won(me));
    }

    #[test]
    fn test_too_weak_for_settlement() {
        let mut game = arena();
        let me = game.current_player();
        let enemy = PlayerId(1 - me.index());
        let settlement = game
            .owned_tiles(enemy)
            .into_iter()
            .find(|t| game.graph()[*t].kind() == TileKindId::Settlement)
            .unwrap();
        let staging = game
            .graph()
            .neighbors(settlement)
            .into_iter()
            .find(|t| game.graph()[*t].kind() == TileKindId::Empty)
            .unwrap();
        let id = game.entities.spawn(crate::catalog::EntityKindId::Soldier, me);
        game.graph.push_entity(staging, id);
        game.grab_entity(me, staging).unwrap();
        assert_eq!(game.place_entities(me, settlement), Err(ActionError::TooWeak));
    }
}
