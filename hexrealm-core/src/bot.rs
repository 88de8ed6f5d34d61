//! Greedy computer player
//!
//! Each turn the bot grows its economy, trains soldiers at its barracks and
//! marches every stack one step along the shortest path to the nearest enemy
//! settlement.

use crate::board::Hex;
use crate::catalog::{TileKindId, ACCESSIBLE, OWNABLE};
use crate::error::ActionError;
use crate::game::{Game, GameResult};
use crate::graph::TileId;
use crate::inventory::Resource;
use crate::pathfinder::find_path;
use crate::player::{PlayerId, MAX_CARRIED};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Facilities the bot wants around its realm, with how many of each
const WISHLIST: [(TileKindId, usize); 5] = [
    (TileKindId::Barracks, 1),
    (TileKindId::Field, 2),
    (TileKindId::Woodcutter, 1),
    (TileKindId::Quarry, 1),
    (TileKindId::Mine, 1),
];

/// Food kept back so soldiers on the map can still move
const FOOD_RESERVE: i32 = 12;

// ============================================================================
// GREEDY BOT
// ============================================================================

/// What the bot did during one turn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub built: u32,
    pub upgraded: u32,
    pub trained: u32,
    pub marched: u32,
}

impl TurnReport {
    fn absorb(&mut self, other: TurnReport) {
        self.built += other.built;
        self.upgraded += other.upgraded;
        self.trained += other.trained;
        self.marched += other.marched;
    }
}

pub struct GreedyBot {
    /// Soldiers trained per barracks per turn
    pub train_per_turn: usize,
    rng: ChaCha8Rng,
}

impl Default for GreedyBot {
    fn default() -> Self {
        Self::new()
    }
}

impl GreedyBot {
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { train_per_turn: 2, rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Play the current player's turn and end it
    pub fn play_turn(&mut self, game: &mut Game) -> Result<TurnReport, ActionError> {
        let me = game.current_player();
        let mut report = TurnReport::default();
        self.develop(game, me, &mut report);
        if !game.is_over() {
            self.train(game, me, &mut report);
        }
        if !game.is_over() {
            self.march(game, me, &mut report);
        }
        if !game.is_over() {
            game.done(me)?;
        }
        debug!(%me, ?report, "bot turn");
        Ok(report)
    }

    /// Let the bot play every seat until someone wins or `max_rounds` pass.
    /// Returns the accumulated report per player.
    pub fn play_game(
        &mut self,
        game: &mut Game,
        max_rounds: u32,
    ) -> Result<(GameResult, Vec<TurnReport>), ActionError> {
        if !game.is_started() {
            game.start();
        }
        let mut reports = vec![TurnReport::default(); game.players().len()];
        while !game.is_over() && game.round() <= max_rounds {
            let me = game.current_player();
            let report = self.play_turn(game)?;
            reports[me.index()].absorb(report);
        }
        info!(result = ?game.result(), rounds = game.round(), "bot game finished");
        Ok((game.result(), reports))
    }

    // ------------------------------------------------------------------------
    // Economy
    // ------------------------------------------------------------------------

    fn develop(&mut self, game: &mut Game, me: PlayerId, report: &mut TurnReport) {
        let settlements: Vec<TileId> = owned_of(game, me, OWNABLE);
        for settlement in settlements {
            for (kind, wanted) in WISHLIST {
                if owned_of(game, me, &[kind]).len() >= wanted {
                    continue;
                }
                let mut candidates = game.graph().neighbors(settlement);
                candidates.shuffle(&mut self.rng);
                let target = candidates
                    .into_iter()
                    .find(|t| game.validate_facility(me, settlement, *t, kind).is_ok());
                if let Some(target) = target {
                    if game.build_facility(me, settlement, target, kind).is_ok() {
                        report.built += 1;
                    }
                }
            }
            // Upgrading invalidates the handle, so it comes last
            let has_army = !owned_of(game, me, &[TileKindId::Barracks]).is_empty();
            if has_army
                && game.validate_upgrade(me, settlement).is_ok()
                && game.upgrade_settlement(me, settlement).is_ok()
            {
                report.upgraded += 1;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Military
    // ------------------------------------------------------------------------

    fn train(&mut self, game: &mut Game, me: PlayerId, report: &mut TurnReport) {
        for barracks in owned_of(game, me, &[TileKindId::Barracks]) {
            if game.graph()[barracks].controlled_by().is_none() {
                continue;
            }
            let Some(step) = step_toward_enemy(game, me, barracks) else {
                continue;
            };
            let cost = TileKindId::Barracks
                .kind()
                .produces
                .map(|e| e.kind().build_cost)
                .unwrap_or_default();
            let mut trained = 0;
            while trained < self.train_per_turn.min(MAX_CARRIED) {
                let affordable = game.player(me).is_some_and(|p| {
                    p.inventory.has(&cost)
                        && p.inventory.amount(Resource::Food) - cost.food >= FOOD_RESERVE
                });
                if !affordable {
                    break;
                }
                if game.grab_entity(me, barracks).is_err() {
                    break;
                }
                trained += 1;
            }
            if trained == 0 {
                continue;
            }
            report.trained += trained as u32;
            self.put_down(game, me, step);
            if game.is_over() {
                return;
            }
        }
    }

    fn march(&mut self, game: &mut Game, me: PlayerId, report: &mut TurnReport) {
        let stacks: Vec<Hex> = game
            .graph()
            .iter()
            .filter(|(_, t)| {
                t.top_entity().and_then(|e| game.entities().get(e)).is_some_and(|e| e.owner == me)
            })
            .map(|(_, t)| t.hex())
            .collect();

        for hex in stacks {
            let Some(source) = game.graph().at(hex) else {
                continue;
            };
            let movable = game.graph()[source]
                .entities()
                .iter()
                .filter(|e| game.entities().get(**e).is_some_and(|e| e.owner == me && !e.moved))
                .count();
            if movable == 0 {
                continue;
            }
            let Some(step) = step_toward_enemy(game, me, source) else {
                continue;
            };
            let mut carried = 0;
            for _ in 0..movable.min(MAX_CARRIED) {
                if game.grab_entity(me, source).is_err() {
                    break;
                }
                carried += 1;
            }
            if carried > 0 {
                report.marched += carried;
                self.put_down(game, me, step);
            }
            if game.is_over() {
                return;
            }
        }
    }

    /// Place the hand on `step` when strong enough, otherwise put it back
    fn put_down(&mut self, game: &mut Game, me: PlayerId, step: TileId) {
        let carried = game.player(me).map_or(0, |p| p.carried_count());
        let strong_enough = game
            .graph()
            .get(step)
            .is_some_and(|t| t.def().health_points <= carried);
        if strong_enough {
            let _ = game.place_entities(me, step);
        }
        let still_carrying = game.player(me).is_some_and(|p| p.carries_entities());
        if still_carrying && !game.is_over() {
            let _ = game.cancel_entity_placement(me);
        }
    }
}

/// The player's tiles of the given kinds
fn owned_of(game: &Game, player: PlayerId, kinds: &[TileKindId]) -> Vec<TileId> {
    game.graph()
        .all_of(kinds)
        .into_iter()
        .filter(|t| game.graph()[*t].owner() == Some(player))
        .collect()
}

/// Next tile on the shortest walkable path to the closest enemy settlement
fn step_toward_enemy(game: &Game, me: PlayerId, from: TileId) -> Option<TileId> {
    let graph = game.graph();
    let origin = graph[from].hex();
    let mut enemies: Vec<TileId> = graph
        .all_of(OWNABLE)
        .into_iter()
        .filter(|t| graph[*t].owner().is_some_and(|o| o != me))
        .collect();
    enemies.sort_by_key(|t| graph[*t].hex().distance_to(origin));
    enemies
        .into_iter()
        .map(|enemy| find_path(graph, from, enemy, ACCESSIBLE))
        .find(|path| path.len() >= 2)
        .map(|path| path[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn small_config(players: usize) -> GameConfig {
        let mut config = GameConfig::with_players(players);
        config.generation.size = 24;
        config.generation.forest_count = 6;
        config.generation.mountain_count = 3;
        config.generation.lake_count = 2;
        config.generation.deep_ocean_margin = 4;
        config.generation.seed = Some("20240601".into());
        config
    }

    #[test]
    fn test_first_turn_builds_barracks() {
        let mut game = Game::generate(&small_config(2)).unwrap();
        game.start();
        let me = game.current_player();
        let mut bot = GreedyBot::new();
        let report = bot.play_turn(&mut game).unwrap();
        assert!(report.built >= 1);
        assert_eq!(owned_of(&game, me, &[TileKindId::Barracks]).len(), 1);
        assert_ne!(game.current_player(), me);
    }

    #[test]
    fn test_bot_game_is_deterministic() {
        let play = || {
            let mut game = Game::generate(&small_config(2)).unwrap();
            let mut bot = GreedyBot::with_seed(5);
            let (result, reports) = bot.play_game(&mut game, 15).unwrap();
            let scores: Vec<i32> = game.players().iter().map(|p| p.score).collect();
            (result, reports, scores, game.round())
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn test_bot_respects_round_limit() {
        let mut game = Game::generate(&small_config(3)).unwrap();
        let mut bot = GreedyBot::new();
        bot.play_game(&mut game, 4).unwrap();
        assert!(game.is_over() || game.round() == 5);
        for p in game.players() {
            assert!(p.inventory.amounts().iter().all(|(_, a)| a >= 0));
            assert_eq!(p.carried_count(), 0);
        }
    }
}
