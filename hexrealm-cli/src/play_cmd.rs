//! Play command - greedy bots play every seat
//!
//! - Level 1: run() - orchestration
//! - Level 2: play_game(), report_results()
//! - Level 3: formatting utilities

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use hexrealm_core::{Game, GameResult, GreedyBot, Resources, TurnReport};

use crate::render::render_ascii;
use crate::world_args::WorldArgs;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    pub world: WorldArgs,

    /// Maximum rounds before the game is called a draw
    #[arg(long, default_value = "60")]
    pub max_rounds: u32,

    /// Seed for the bots' own choices
    #[arg(long, default_value = "42")]
    pub bot_seed: u64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the final map
    #[arg(long)]
    pub ascii: bool,
}

#[derive(Clone, Debug, Serialize)]
struct PlayerRecord {
    name: String,
    score: i32,
    defeated: bool,
    tiles: usize,
    inventory: Resources,
    totals: TurnReport,
}

#[derive(Clone, Debug, Serialize)]
struct GameRecord {
    seed: String,
    winner: Option<String>,
    rounds: u32,
    players: Vec<PlayerRecord>,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
pub fn run(args: PlayArgs) -> Result<()> {
    let config = args.world.resolve()?;
    let mut game = Game::generate(&config)?;

    tracing::info!(
        "Starting bot game: seed {} ({} players, max {} rounds)",
        game.seed(),
        game.players().len(),
        args.max_rounds
    );

    let record = play_game(&mut game, &args)?;
    report_results(&record, &args);
    if args.ascii {
        println!();
        print!("{}", render_ascii(game.graph(), true));
    }
    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

fn play_game(game: &mut Game, args: &PlayArgs) -> Result<GameRecord> {
    let mut bot = GreedyBot::with_seed(args.bot_seed);
    let (result, totals) = bot
        .play_game(game, args.max_rounds)
        .context("bot turn was rejected")?;
    Ok(record_game(game, result, &totals))
}

fn record_game(game: &Game, result: GameResult, totals: &[TurnReport]) -> GameRecord {
    let winner = match result {
        GameResult::Won(player) => game.player(player).map(|p| p.name.clone()),
        GameResult::Ongoing => None,
    };
    let players = game
        .players()
        .iter()
        .zip(totals)
        .map(|(p, totals)| PlayerRecord {
            name: p.name.clone(),
            score: p.score,
            defeated: p.defeated,
            tiles: game.owned_tiles(p.id).len(),
            inventory: p.inventory.amounts(),
            totals: *totals,
        })
        .collect();
    GameRecord {
        seed: game.seed().to_string(),
        winner,
        rounds: game.round(),
        players,
    }
}

fn report_results(record: &GameRecord, args: &PlayArgs) {
    if args.json {
        if let Ok(json) = serde_json::to_string_pretty(record) {
            println!("{}", json);
        }
    } else {
        print_text_results(record);
    }
}

// ============================================================================
// LEVEL 3 - UTILITIES
// ============================================================================

fn print_text_results(record: &GameRecord) {
    println!("\n=== Game {} ===", record.seed);
    match &record.winner {
        Some(name) => println!("Winner: {} after {} rounds", name, record.rounds),
        None => println!("No winner after {} rounds", record.rounds),
    }
    println!();
    for p in &record.players {
        println!(
            "  {:<10} score {:>4}  tiles {:>3}  built {:>3}  trained {:>3}  marched {:>3}{}",
            p.name,
            p.score,
            p.tiles,
            p.totals.built + p.totals.upgraded,
            p.totals.trained,
            p.totals.marched,
            if p.defeated { "  (defeated)" } else { "" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexrealm_core::GameConfig;

    #[test]
    fn test_record_game() {
        let mut config = GameConfig::with_players(2);
        config.generation.size = 24;
        config.generation.forest_count = 6;
        config.generation.mountain_count = 3;
        config.generation.lake_count = 2;
        config.generation.deep_ocean_margin = 4;
        config.generation.seed = Some("4242".into());
        let mut game = Game::generate(&config).unwrap();
        let mut bot = GreedyBot::with_seed(1);
        let (result, totals) = bot.play_game(&mut game, 3).unwrap();
        let record = record_game(&game, result, &totals);
        assert_eq!(record.seed, "4242");
        assert_eq!(record.players.len(), 2);
        assert!(record.players.iter().all(|p| p.tiles >= 3));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["players"][0]["name"], "Player 1");
    }
}
