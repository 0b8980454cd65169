//! Runtime tuning shared by every species

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds for patrol stuck detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckConfig {
    /// How often the patrol position is sampled
    pub sample_interval_ms: u64,
    /// Displacement below this between samples counts as not moving
    pub min_movement: f32,
    /// Accumulated low-movement time that triggers recovery
    pub stuck_time_ms: u64,
    pub recovery_min_distance: f32,
    pub recovery_max_distance: f32,
    /// Radius of a regenerated default route
    pub route_radius: f32,
    pub route_points: usize,
}

impl Default for StuckConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 500,
            min_movement: 2.0,
            stuck_time_ms: 1_500,
            recovery_min_distance: 40.0,
            recovery_max_distance: 120.0,
            route_radius: 100.0,
            route_points: 4,
        }
    }
}

/// Global AI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Seed for route phases and recovery distances
    pub seed: u64,
    /// Distance at which a waypoint counts as reached
    pub waypoint_arrival_radius: f32,
    /// Pause at each reached waypoint
    pub patrol_wait_ms: u64,
    /// Pool capacity for species that do not set their own
    pub default_pool_capacity: usize,
    pub stuck: StuckConfig,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            waypoint_arrival_radius: 8.0,
            patrol_wait_ms: 1_000,
            default_pool_capacity: 32,
            stuck: StuckConfig::default(),
        }
    }
}

impl AiConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            patrol_wait_ms = 250

            [stuck]
            stuck_time_ms = 900
            "#,
        )
        .unwrap();
        assert_eq!(config.patrol_wait_ms, 250);
        assert_eq!(config.stuck.stuck_time_ms, 900);
        assert_eq!(config.stuck.sample_interval_ms, 500);
        assert_eq!(config.default_pool_capacity, 32);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = AiConfig::from_toml_str("patrol_wait_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, AiError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AiConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, AiError::Io(_)));
    }
}
