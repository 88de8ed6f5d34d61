//! Game configuration (JSON)

use crate::error::WorldError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Most players a world can be generated for
pub const MAX_PLAYERS: usize = 6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub color: String,
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self { name: name.into(), color: color.into() }
    }
}

/// World generation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Width of the shallow ocean window, in tiles
    pub size: i32,
    /// Forest groups per player
    pub forest_count: u32,
    /// Mountain ranges per player
    pub mountain_count: u32,
    /// Lakes per player
    pub lake_count: u32,
    /// Seed string; a random 8-digit seed is drawn when absent
    pub seed: Option<String>,
    /// Extra width of the deep ocean band
    pub deep_ocean_margin: i32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            size: 50,
            forest_count: 60,
            mountain_count: 20,
            lake_count: 10,
            seed: None,
            deep_ocean_margin: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub players: Vec<PlayerConfig>,
    pub winning_score: i32,
    /// Amount of each resource granted when the game starts
    pub starting_resources: i32,
    pub generation: GenerationConfig,
}

const DEFAULT_COLORS: [&str; MAX_PLAYERS] =
    ["#d94141", "#3f72d9", "#e3c337", "#46a35a", "#9b59b6", "#e67e22"];

impl Default for GameConfig {
    fn default() -> Self {
        Self::with_players(2)
    }
}

impl GameConfig {
    /// Default configuration with `count` generically named players
    pub fn with_players(count: usize) -> Self {
        let players = (0..count)
            .map(|i| PlayerConfig::new(format!("Player {}", i + 1), DEFAULT_COLORS[i % MAX_PLAYERS]))
            .collect();
        Self {
            players,
            winning_score: 100,
            starting_resources: 100,
            generation: GenerationConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        let count = self.players.len();
        if count == 0 || count > MAX_PLAYERS {
            return Err(WorldError::InvalidPlayerCount { count, max: MAX_PLAYERS });
        }
        Ok(())
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: GameConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.players.len(), 2);
        assert_eq!(config.winning_score, 100);
        assert_eq!(config.starting_resources, 100);
        assert_eq!(config.generation.size, 50);
        assert_eq!(config.generation.deep_ocean_margin, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_player_count_bounds() {
        assert_eq!(
            GameConfig::with_players(0).validate(),
            Err(WorldError::InvalidPlayerCount { count: 0, max: MAX_PLAYERS })
        );
        assert!(GameConfig::with_players(6).validate().is_ok());
        assert!(GameConfig::with_players(7).validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let mut config = GameConfig::with_players(3);
        config.generation.seed = Some("12345678".into());
        config.winning_score = 40;
        config.save(&path).unwrap();
        assert_eq!(GameConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"winning_score": 25, "generation": {"size": 20}}"#).unwrap();
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.winning_score, 25);
        assert_eq!(config.generation.size, 20);
        assert_eq!(config.generation.forest_count, 60);
        assert_eq!(config.players.len(), 2);
    }
}
