//! Scenario configuration for the simulator
//!
//! Loaded from, in order:
//! 1. The first non-flag command line argument
//! 2. `sim.toml` in the working directory
//! 3. Built-in defaults
//!
//! `HORDE_TICKS` and `HORDE_SEED` override the loaded values.

use horde_ai::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::result::Result;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to parse scenario: {0}")]
    Config(#[from] toml::de::Error),
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// The scripted player the horde hunts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub position: Vec2,
    pub half_extents: Vec2,
    pub max_health: f32,
    /// Physical damage resistance fraction
    pub armor: f32,
    /// Units per second along `path`
    pub speed: f32,
    /// Waypoints walked in a loop; empty stands still
    pub path: Vec<Vec2>,
    pub attack_damage: f32,
    /// Zero disables the player's attacks
    pub attack_interval_ms: u64,
    pub attack_radius: f32,
    /// Stun applied with every player hit
    pub stun_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            half_extents: Vec2::splat(8.0),
            max_health: 500.0,
            armor: 0.1,
            speed: 50.0,
            path: vec![
                Vec2::new(-120.0, 0.0),
                Vec2::new(120.0, 0.0),
            ],
            attack_damage: 25.0,
            attack_interval_ms: 800,
            attack_radius: 40.0,
            stun_ms: 0,
        }
    }
}

/// A group of agents entering at a fixed time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnGroup {
    pub species: String,
    pub position: Vec2,
    pub count: usize,
    /// Distance between group members along +X
    pub spacing: f32,
    pub at_ms: u64,
    /// Replaces the species' generated patrol route
    pub route: Vec<Vec2>,
}

impl Default for SpawnGroup {
    fn default() -> Self {
        Self {
            species: "grunt".to_owned(),
            position: Vec2::ZERO,
            count: 1,
            spacing: 24.0,
            at_ms: 0,
            route: Vec::new(),
        }
    }
}

/// Static obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Blocker {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Blocker {
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_center_half_extents(self.center, self.half_extents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub ticks: u64,
    pub tick_ms: u64,
    /// Extra species merged over the built-in table, relative to the scenario file
    pub species_file: Option<PathBuf>,
    pub ai: AiConfig,
    pub player: PlayerConfig,
    pub spawns: Vec<SpawnGroup>,
    pub blockers: Vec<Blocker>,
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 1_200,
            tick_ms: 16,
            species_file: None,
            ai: AiConfig::default(),
            player: PlayerConfig::default(),
            spawns: vec![
                SpawnGroup {
                    species: "grunt".to_owned(),
                    position: Vec2::new(200.0, 60.0),
                    count: 3,
                    ..SpawnGroup::default()
                },
                SpawnGroup {
                    species: "charger".to_owned(),
                    position: Vec2::new(-260.0, -40.0),
                    at_ms: 2_000,
                    ..SpawnGroup::default()
                },
                SpawnGroup {
                    species: "brute".to_owned(),
                    position: Vec2::new(0.0, 220.0),
                    at_ms: 4_000,
                    ..SpawnGroup::default()
                },
            ],
            blockers: Vec::new(),
            config_path: None,
        }
    }
}

impl SimConfig {
    /// Load the scenario from all sources
    pub fn load() -> Result<Self, SimError> {
        let from_args = std::env::args().skip(1).find(|arg| !arg.starts_with("--"));

        let mut config = match from_args {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                log::info!("Loaded scenario from {}", path);
                config
            }
            None if Path::new("sim.toml").exists() => {
                let config = Self::load_from_file("sim.toml")?;
                log::info!("Loaded scenario from sim.toml");
                config
            }
            None => {
                log::info!("No scenario file, using built-in defaults");
                Self::default()
            }
        };

        if let Some(ticks) = env_parse::<u64>("HORDE_TICKS") {
            config.ticks = ticks;
            log::info!("Ticks from env: {}", ticks);
        }
        if let Some(seed) = env_parse::<u64>("HORDE_SEED") {
            config.ai.seed = seed;
            log::info!("Seed from env: {}", seed);
        }

        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&source)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(source)?)
    }

    /// Built-in species with any from `species_file` layered on top
    pub fn species_table(&self) -> Result<SpeciesTable, SimError> {
        let mut table = SpeciesTable::builtin();
        let Some(file) = &self.species_file else {
            return Ok(table);
        };

        let path = match self.config_path.as_deref().and_then(Path::parent) {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.clone(),
        };
        let extra = SpeciesTable::load(&path)?;
        for id in extra.ids() {
            if let Some(profile) = extra.get(id) {
                if table.contains(id) {
                    log::info!("Species '{}' overridden by {}", id, path.display());
                }
                table.insert(id.clone(), (*profile).clone())?;
            }
        }
        Ok(table)
    }

    pub fn print_summary(&self) {
        log::info!("Scenario:");
        log::info!("  Ticks: {} x {}ms", self.ticks, self.tick_ms);
        log::info!("  Seed: {:#x}", self.ai.seed);
        log::info!(
            "  Spawn groups: {}, agents: {}",
            self.spawns.len(),
            self.spawns.iter().map(|g| g.count).sum::<usize>()
        );
        if !self.blockers.is_empty() {
            log::info!("  Blockers: {}", self.blockers.len());
        }
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path.display());
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("Ignoring unparsable {}={}", key, value);
            None
        }
    }
}
