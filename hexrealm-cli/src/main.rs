//! HEXREALM CLI - Command-line interface
//!
//! Commands:
//! - generate: Generate a world and print its summary or an ASCII map
//! - play: Let greedy bots play a full game
//! - survey: Generate many worlds in parallel and report statistics

mod generate_cmd;
mod play_cmd;
mod render;
mod survey_cmd;
mod world_args;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexrealm")]
#[command(about = "HEXREALM hex world simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world
    Generate(generate_cmd::GenerateArgs),
    /// Play a bot game
    Play(play_cmd::PlayArgs),
    /// Survey many generated worlds
    Survey(survey_cmd::SurveyArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate_cmd::run(args),
        Commands::Play(args) => play_cmd::run(args),
        Commands::Survey(args) => survey_cmd::run(args),
    }
}
