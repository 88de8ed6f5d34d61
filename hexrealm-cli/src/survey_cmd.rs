//! Survey command - generate many worlds in parallel and aggregate them

use anyhow::Result;
use clap::Args;
use rayon::prelude::*;
use serde::Serialize;

use hexrealm_core::{GameConfig, PlayerId, PlayerState, TileKindId, WorldGenerator, WorldSummary};

use crate::world_args::WorldArgs;

#[derive(Args)]
pub struct SurveyArgs {
    #[command(flatten)]
    pub world: WorldArgs,

    /// Number of worlds to generate
    #[arg(long, default_value = "100")]
    pub worlds: usize,

    /// First numeric seed; world i uses seed `start + i`
    #[arg(long, default_value = "10000000")]
    pub start: u64,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct SurveyStats {
    worlds: usize,
    failed: usize,
    disconnected: Vec<String>,
    avg_tiles: f64,
    avg_land_share: f64,
    avg_spawn_path: f64,
    min_spawn_path: Option<usize>,
    max_spawn_path: Option<usize>,
}

/// Run survey command
pub fn run(args: SurveyArgs) -> Result<()> {
    let config = args.world.resolve()?;
    tracing::info!(
        "Surveying {} worlds ({} players, size {})",
        args.worlds,
        config.players.len(),
        config.generation.size
    );

    let seeds: Vec<String> = (0..args.worlds as u64).map(|i| (args.start + i).to_string()).collect();
    let summaries: Vec<Option<WorldSummary>> = seeds
        .par_iter()
        .map(|seed| survey_one(&config, seed))
        .collect();

    let stats = aggregate(&summaries);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_text_stats(&stats);
    }
    Ok(())
}

fn survey_one(config: &GameConfig, seed: &str) -> Option<WorldSummary> {
    let mut generation = config.generation.clone();
    generation.seed = Some(seed.to_string());
    let mut players: Vec<PlayerState> = config
        .players
        .iter()
        .enumerate()
        .map(|(i, p)| PlayerState::new(PlayerId(i), p.name.clone(), p.color.clone()))
        .collect();
    match WorldGenerator::generate(&generation, &mut players) {
        Ok(world) => Some(WorldSummary::new(&world.graph, &world.seed, &world.spawns)),
        Err(e) => {
            tracing::warn!("world {} failed: {}", seed, e);
            None
        }
    }
}

fn aggregate(summaries: &[Option<WorldSummary>]) -> SurveyStats {
    let ok: Vec<&WorldSummary> = summaries.iter().flatten().collect();
    let mut stats = SurveyStats {
        worlds: summaries.len(),
        failed: summaries.len() - ok.len(),
        ..SurveyStats::default()
    };
    if ok.is_empty() {
        return stats;
    }

    let water = |s: &WorldSummary| {
        s.count(TileKindId::Lake) + s.count(TileKindId::Ocean) + s.count(TileKindId::DeepOcean)
    };
    let n = ok.len() as f64;
    stats.avg_tiles = ok.iter().map(|s| s.tiles as f64).sum::<f64>() / n;
    stats.avg_land_share = ok
        .iter()
        .map(|s| 1.0 - water(s) as f64 / s.tiles.max(1) as f64)
        .sum::<f64>()
        / n;
    stats.disconnected = ok
        .iter()
        .filter(|s| !s.spawns_connected())
        .map(|s| s.seed.clone())
        .collect();

    let paths: Vec<usize> = ok.iter().flat_map(|s| s.spawn_paths.iter().flatten().copied()).collect();
    if !paths.is_empty() {
        stats.avg_spawn_path = paths.iter().sum::<usize>() as f64 / paths.len() as f64;
        stats.min_spawn_path = paths.iter().min().copied();
        stats.max_spawn_path = paths.iter().max().copied();
    }
    stats
}

fn print_text_stats(stats: &SurveyStats) {
    println!("\n=== Survey ===");
    println!("Worlds:        {} ({} failed)", stats.worlds, stats.failed);
    println!("Avg tiles:     {:.1}", stats.avg_tiles);
    println!("Land share:    {:.1}%", stats.avg_land_share * 100.0);
    match (stats.min_spawn_path, stats.max_spawn_path) {
        (Some(min), Some(max)) => println!(
            "Spawn paths:   avg {:.1}, min {}, max {}",
            stats.avg_spawn_path, min, max
        ),
        _ => println!("Spawn paths:   none"),
    }
    if stats.disconnected.is_empty() {
        println!("Disconnected:  none");
    } else {
        println!("Disconnected:  {}", stats.disconnected.join(", "));
    }
}
