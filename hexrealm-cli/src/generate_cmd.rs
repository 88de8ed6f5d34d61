//! Generate command - build one world and describe it

use anyhow::Result;
use clap::Args;

use hexrealm_core::{Game, PlayerState, TileKindId, WorldSummary};

use crate::render::{legend, render_ascii};
use crate::world_args::WorldArgs;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub world: WorldArgs,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Print an ASCII map
    #[arg(long)]
    pub ascii: bool,
}

/// Run generate command
pub fn run(args: GenerateArgs) -> Result<()> {
    let config = args.world.resolve()?;
    let game = Game::generate(&config)?;
    let summary = WorldSummary::new(game.graph(), game.seed(), game.spawns());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_text_summary(&summary, game.players());
    }
    if args.ascii {
        println!();
        print!("{}", render_ascii(game.graph(), true));
        println!("{}", legend());
    }
    Ok(())
}

fn print_text_summary(summary: &WorldSummary, players: &[PlayerState]) {
    println!("\n=== World {} ===", summary.seed);
    println!("Tiles:      {}", summary.tiles);
    println!("Bounds:     x ±{:.1}, z ±{:.1}", summary.bounds.0, summary.bounds.1);
    println!("Landmarks:  {}", summary.landmarks);

    println!("\nTerrain:");
    for kind in TileKindId::ALL {
        let count = summary.count(kind);
        if count > 0 {
            println!("  {:<12} {}", kind.kind().title, count);
        }
    }

    println!("\nSpawns:");
    for (player, hex) in players.iter().zip(&summary.spawns) {
        println!("  {:<10} ({}, {})", player.name, hex.q, hex.r);
    }
    for (i, path) in summary.spawn_paths.iter().enumerate() {
        match path {
            Some(steps) => println!("  path {} -> {}: {} steps", i + 1, i + 2, steps),
            None => println!("  path {} -> {}: unreachable", i + 1, i + 2),
        }
    }
}
