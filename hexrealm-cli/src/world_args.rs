//! World options shared by every command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use hexrealm_core::GameConfig;

#[derive(Args, Clone, Debug)]
pub struct WorldArgs {
    /// Game configuration JSON file (defaults apply to missing fields)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of players (overrides the config file)
    #[arg(long)]
    pub players: Option<usize>,

    /// Seed string (overrides the config file)
    #[arg(long)]
    pub seed: Option<String>,

    /// Shallow ocean window size in tiles (overrides the config file)
    #[arg(long)]
    pub size: Option<i32>,
}

impl WorldArgs {
    /// Resolve the configuration: file first, then command-line overrides
    pub fn resolve(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        if let Some(players) = self.players {
            let generation = config.generation.clone();
            let (winning_score, starting_resources) = (config.winning_score, config.starting_resources);
            config = GameConfig::with_players(players);
            config.generation = generation;
            config.winning_score = winning_score;
            config.starting_resources = starting_resources;
        }
        if let Some(seed) = &self.seed {
            config.generation.seed = Some(seed.clone());
        }
        if let Some(size) = self.size {
            config.generation.size = size;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> WorldArgs {
        WorldArgs { config: None, players: None, seed: None, size: None }
    }

    #[test]
    fn test_defaults() {
        let config = args().resolve().unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let mut file_config = GameConfig::with_players(2);
        file_config.winning_score = 30;
        file_config.save(&path).unwrap();

        let resolved = WorldArgs {
            config: Some(path),
            players: Some(4),
            seed: Some("777".into()),
            size: Some(30),
        }
        .resolve()
        .unwrap();
        assert_eq!(resolved.players.len(), 4);
        assert_eq!(resolved.winning_score, 30);
        assert_eq!(resolved.generation.seed.as_deref(), Some("777"));
        assert_eq!(resolved.generation.size, 30);
    }

    #[test]
    fn test_rejects_too_many_players() {
        let mut a = args();
        a.players = Some(9);
        assert!(a.resolve().is_err());
    }
}
