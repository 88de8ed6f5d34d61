//! Game state and turn sequencing
//!
//! `Game` owns the world and every player. All mutation goes through
//! `&mut Game`, one action at a time, and every player action is checked
//! against the turn order before anything changes.

use crate::board::Hex;
use crate::catalog::OWNABLE;
use crate::config::{GameConfig, MAX_PLAYERS};
use crate::entity::EntityStore;
use crate::error::{ActionError, WorldError};
use crate::events::{EventBus, GameEvent, SubscriptionId};
use crate::generator::{seed_from_string, WorldGenerator};
use crate::graph::{TileGraph, TileId};
use crate::inventory::{Resource, Resources};
use crate::player::{PlayerId, PlayerState};
use crate::realm::update_realms;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Stream of the game RNG (shuffle, combat), apart from generation
const GAME_STREAM: u64 = 1;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Scoring and economy knobs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    pub winning_score: i32,
    pub starting_resources: i32,
}

impl Default for Rules {
    fn default() -> Self {
        Self { winning_score: 100, starting_resources: 100 }
    }
}

impl From<&GameConfig> for Rules {
    fn from(config: &GameConfig) -> Self {
        Self {
            winning_score: config.winning_score,
            starting_resources: config.starting_resources,
        }
    }
}

/// Game result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    Ongoing,
    Won(PlayerId),
}

#[derive(Debug)]
pub struct Game {
    pub(crate) graph: TileGraph,
    pub(crate) entities: EntityStore,
    pub(crate) players: Vec<PlayerState>,
    pub(crate) turn_order: Vec<PlayerId>,
    pub(crate) current: usize,
    pub(crate) round: u32,
    pub(crate) result: GameResult,
    pub(crate) rules: Rules,
    pub(crate) events: EventBus,
    pub(crate) rng: ChaCha8Rng,
    seed: String,
    spawns: Vec<Hex>,
    started: bool,
}

impl Game {
    /// Generate a fresh world for the configured players
    pub fn generate(config: &GameConfig) -> Result<Self, WorldError> {
        config.validate()?;
        let mut players: Vec<PlayerState> = config
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| PlayerState::new(PlayerId(i), p.name.clone(), p.color.clone()))
            .collect();
        let world = WorldGenerator::generate(&config.generation, &mut players)?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed_from_string(&world.seed));
        rng.set_stream(GAME_STREAM);
        Ok(Self::assemble(world.graph, players, Rules::from(config), rng, world.seed, world.spawns))
    }

    /// Wrap an existing graph. Each player's capacity is seeded from the
    /// storage of the tiles they own.
    pub fn from_parts(
        graph: TileGraph,
        mut players: Vec<PlayerState>,
        rules: Rules,
        seed: u64,
    ) -> Result<Self, WorldError> {
        let count = players.len();
        if count == 0 || count > MAX_PLAYERS {
            return Err(WorldError::InvalidPlayerCount { count, max: MAX_PLAYERS });
        }
        for (i, player) in players.iter_mut().enumerate() {
            player.id = PlayerId(i);
            let storage = graph
                .owned_by(player.id)
                .into_iter()
                .fold(Resources::ZERO, |acc, t| acc + graph[t].def().storage);
            player.inventory.add_capacities(storage);
        }
        let spawns = players
            .iter()
            .filter_map(|p| {
                graph
                    .all_of(OWNABLE)
                    .into_iter()
                    .find(|t| graph[*t].owner() == Some(p.id))
                    .map(|t| graph[t].hex())
            })
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(GAME_STREAM);
        Ok(Self::assemble(graph, players, rules, rng, seed.to_string(), spawns))
    }

    fn assemble(
        graph: TileGraph,
        players: Vec<PlayerState>,
        rules: Rules,
        rng: ChaCha8Rng,
        seed: String,
        spawns: Vec<Hex>,
    ) -> Self {
        let turn_order = players.iter().map(|p| p.id).collect();
        Self {
            graph,
            entities: EntityStore::new(),
            players,
            turn_order,
            current: 0,
            round: 0,
            result: GameResult::Ongoing,
            rules,
            events: EventBus::new(),
            rng,
            seed,
            spawns,
            started: false,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn graph(&self) -> &TileGraph {
        &self.graph
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.get(id.index())
    }

    /// Player whose turn it is
    pub fn current_player(&self) -> PlayerId {
        self.turn_order[self.current]
    }

    pub fn turn_order(&self) -> &[PlayerId] {
        &self.turn_order
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    pub fn is_over(&self) -> bool {
        self.result != GameResult::Ongoing
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Initial settlement position of each player
    pub fn spawns(&self) -> &[Hex] {
        &self.spawns
    }

    /// World bounds for camera clamping
    pub fn bounds(&self) -> (f64, f64) {
        self.graph.bounds()
    }

    pub fn owned_tiles(&self, player: PlayerId) -> Vec<TileId> {
        self.graph.owned_by(player)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    // ========================================================================
    // TURN SEQUENCE
    // ========================================================================

    /// Shuffle the turn order, hand out starting resources and open round 1
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.turn_order.shuffle(&mut self.rng);
        let grant = Resources::splat(self.rules.starting_resources);
        for i in 0..self.players.len() {
            self.players[i].inventory.give_all(&grant);
            let player = self.players[i].id;
            self.publish(GameEvent::InventoryChanged { player });
        }
        self.publish(GameEvent::PlayersChanged);

        self.started = true;
        self.round = 1;
        self.current = self
            .turn_order
            .iter()
            .position(|p| !self.players[p.index()].defeated)
            .unwrap_or(0);
        info!(order = ?self.turn_order, seed = %self.seed, "game started");
        self.publish(GameEvent::RoundStarted { round: 1 });
        self.begin_turn();
    }

    /// End the player's turn, returning any carried entities first
    pub fn done(&mut self, player: PlayerId) -> Result<(), ActionError> {
        let result = self.ensure_turn(player);
        if result.is_ok() {
            if self.players[player.index()].carries_entities() {
                self.return_hand(player);
            }
            debug!(%player, round = self.round, "player done");
            self.publish(GameEvent::PlayerDone { player });
            self.next_player(player);
        }
        self.report(player, result)
    }

    fn next_player(&mut self, finished: PlayerId) {
        if self.players[finished.index()].score >= self.rules.winning_score {
            self.declare_winner(finished);
            return;
        }
        for _ in 0..self.turn_order.len() {
            self.current += 1;
            if self.current >= self.turn_order.len() {
                self.current = 0;
                self.round += 1;
                info!(round = self.round, "round started");
                self.publish(GameEvent::RoundStarted { round: self.round });
            }
            if !self.players[self.current_player().index()].defeated {
                break;
            }
        }
        self.publish(GameEvent::PlayersChanged);
        self.begin_turn();
    }

    /// Reset movement, then run consumption and production of the player's
    /// attached structures in creation order
    fn begin_turn(&mut self) {
        let player = self.current_player();
        self.entities.reset_moved(player);

        let producers: Vec<TileId> = self
            .graph
            .iter()
            .filter(|(_, t)| {
                t.kind().is_structure() && t.owner() == Some(player) && t.controlled_by().is_some()
            })
            .map(|(id, _)| id)
            .collect();
        let inventory = &mut self.players[player.index()].inventory;
        for id in &producers {
            let def = self.graph[*id].def();
            for resource in Resource::ALL {
                inventory.take(def.consumption.get(resource), resource);
            }
            for resource in Resource::ALL {
                inventory.give(def.production.get(resource), resource);
            }
        }
        debug!(%player, producers = producers.len(), amounts = ?inventory.amounts(), "turn started");
        self.publish(GameEvent::TurnStarted { player });
        self.publish(GameEvent::InventoryChanged { player });
    }

    // ========================================================================
    // WIN CONDITIONS
    // ========================================================================

    /// A player at the winning score wins; otherwise the last undefeated
    /// player does
    pub fn check_winning_conditions(&mut self) -> Option<PlayerId> {
        if let GameResult::Won(winner) = self.result {
            return Some(winner);
        }
        let by_score = self
            .turn_order
            .iter()
            .copied()
            .find(|p| self.players[p.index()].score >= self.rules.winning_score);
        let winner = by_score.or_else(|| {
            let left: Vec<PlayerId> = self
                .turn_order
                .iter()
                .copied()
                .filter(|p| !self.players[p.index()].defeated)
                .collect();
            (left.len() == 1).then(|| left[0])
        })?;
        self.declare_winner(winner);
        Some(winner)
    }

    fn declare_winner(&mut self, winner: PlayerId) {
        if self.result != GameResult::Ongoing {
            return;
        }
        self.result = GameResult::Won(winner);
        info!(%winner, round = self.round, score = self.players[winner.index()].score, "player won");
        self.publish(GameEvent::PlayerWon { player: winner });
    }

    pub(crate) fn defeat(&mut self, player: PlayerId) {
        if self.players[player.index()].defeated {
            return;
        }
        self.players[player.index()].defeated = true;
        info!(%player, "player defeated");
        self.publish(GameEvent::PlayerDefeated { player });
        self.check_winning_conditions();
        self.publish(GameEvent::PlayersChanged);
    }

    // ========================================================================
    // HELPERS
    // ========================================================================

    /// Realm pass followed by a win check and a players refresh
    pub(crate) fn refresh_realms(&mut self) {
        update_realms(&mut self.graph);
        self.check_winning_conditions();
        self.publish(GameEvent::PlayersChanged);
    }

    pub(crate) fn ensure_turn(&self, player: PlayerId) -> Result<(), ActionError> {
        if self.is_over() {
            return Err(ActionError::GameOver);
        }
        if player.index() >= self.players.len() {
            return Err(ActionError::UnknownPlayer(player));
        }
        if !self.started || self.current_player() != player {
            return Err(ActionError::NotYourTurn(player));
        }
        Ok(())
    }

    /// Publish the error cue for a rejected action
    pub(crate) fn report<T>(
        &mut self,
        player: PlayerId,
        result: Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        if let Err(error) = &result {
            debug!(%player, %error, "action rejected");
            self.publish(GameEvent::ActionRejected { player, error: error.clone() });
        }
        result
    }

    pub(crate) fn publish(&mut self, event: GameEvent) {
        self.events.publish(&event);
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TileKindId;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Settlements in a row, each with an attached field
    fn small_game(players: usize) -> Game {
        let mut graph = TileGraph::new(9);
        for i in 0..players {
            let q = i as i32 * 6;
            let s = graph.create(TileKindId::Settlement, Hex::new(q, 0)).unwrap();
            let f = graph.create(TileKindId::Field, Hex::new(q + 1, 0)).unwrap();
            graph.set_owner(s, Some(PlayerId(i)));
            graph.set_owner(f, Some(PlayerId(i)));
            graph.add_facility(s, f);
        }
        let ps = (0..players)
            .map(|i| PlayerState::new(PlayerId(i), format!("p{i}"), "#000"))
            .collect();
        Game::from_parts(graph, ps, Rules::default(), 11).unwrap()
    }

    #[test]
    fn test_start_grants_clamped_inventory() {
        let mut game = small_game(2);
        game.start();
        assert_eq!(game.round(), 1);
        for p in game.players() {
            let storage = TileKindId::Settlement.kind().storage;
            assert_eq!(p.inventory.capacities(), storage);
            assert_eq!(p.inventory.amount(Resource::Wood), 100);
        }
        // The first player already collected field production
        let first = game.current_player();
        let food = game.player(first).unwrap().inventory.amount(Resource::Food);
        assert_eq!(food, 100 + TileKindId::Field.kind().production.food);
    }

    #[test]
    fn test_done_rotates_and_counts_rounds() {
        let mut game = small_game(3);
        game.start();
        let order = game.turn_order().to_vec();
        for expected in &order {
            assert_eq!(game.current_player(), *expected);
            game.done(*expected).unwrap();
        }
        assert_eq!(game.round(), 2);
        assert_eq!(game.current_player(), order[0]);
    }

    #[test]
    fn test_out_of_turn_rejected() {
        let mut game = small_game(2);
        assert_eq!(game.done(PlayerId(0)), Err(ActionError::NotYourTurn(PlayerId(0))));
        game.start();
        let other = game.turn_order()[1];
        assert_eq!(game.done(other), Err(ActionError::NotYourTurn(other)));
        assert_eq!(game.done(PlayerId(9)), Err(ActionError::UnknownPlayer(PlayerId(9))));
    }

    #[test]
    fn test_defeated_players_are_skipped() {
        let mut game = small_game(3);
        game.start();
        let order = game.turn_order().to_vec();
        game.players[order[1].index()].defeated = true;
        game.done(order[0]).unwrap();
        assert_eq!(game.current_player(), order[2]);
    }

    #[test]
    fn test_score_win_ends_game() {
        let mut game = small_game(2);
        game.start();
        let first = game.current_player();
        game.player_mut(first).score = 100;
        game.done(first).unwrap();
        assert_eq!(game.result(), GameResult::Won(first));
        assert_eq!(game.done(first), Err(ActionError::GameOver));
    }

    #[test]
    fn test_last_player_standing_wins() {
        let mut game = small_game(2);
        game.start();
        let order = game.turn_order().to_vec();
        game.defeat(order[0]);
        assert_eq!(game.result(), GameResult::Won(order[1]));
    }

    #[test]
    fn test_events_in_order() {
        let mut game = small_game(2);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        game.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        game.start();
        let first = game.current_player();
        let log = log.borrow();
        let round = log.iter().position(|e| *e == GameEvent::RoundStarted { round: 1 }).unwrap();
        let turn = log.iter().position(|e| *e == GameEvent::TurnStarted { player: first }).unwrap();
        assert!(round < turn);
    }

    #[test]
    fn test_consumption_skipped_when_short() {
        let mut graph = TileGraph::new(2);
        let s = graph.create(TileKindId::Settlement, Hex::ORIGIN).unwrap();
        let w = graph.create(TileKindId::Woodcutter, Hex::new(1, 0)).unwrap();
        graph.set_owner(s, Some(PlayerId(0)));
        graph.set_owner(w, Some(PlayerId(0)));
        graph.add_facility(s, w);
        let ps = vec![PlayerState::new(PlayerId(0), "solo", "#000")];
        let rules = Rules { winning_score: 100, starting_resources: 0 };
        let mut game = Game::from_parts(graph, ps, rules, 1).unwrap();
        game.start();
        let inv = &game.player(PlayerId(0)).unwrap().inventory;
        assert_eq!(inv.amount(Resource::Food), 0);
        assert_eq!(inv.amount(Resource::Wood), 10);
    }
}
