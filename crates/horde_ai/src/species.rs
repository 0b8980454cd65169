//! Species profiles
//!
//! Each species is a [`BehaviorKind`] tag plus data: stats, ranges, ability
//! list and transition table. The behavior executor branches on the tag, so
//! adding a species is a configuration change unless it needs new behavior.

use crate::ability::AbilitySpec;
use crate::cooldown::AbilityId;
use crate::error::{AiError, Result};
use crate::state_machine::TransitionTable;
use horde_combat::CombatStats;
use horde_core::NamedId;
use horde_math::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Species tag
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SpeciesId(NamedId);

impl SpeciesId {
    pub fn new(name: &str) -> Self {
        Self(NamedId::new(name))
    }

    pub fn as_str(&self) -> &str {
        self.0.name()
    }
}

impl fmt::Debug for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpeciesId({})", self.as_str())
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SpeciesId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SpeciesId {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<SpeciesId> for String {
    fn from(id: SpeciesId) -> Self {
        id.as_str().to_owned()
    }
}

/// Which specialization the behavior executor runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorKind {
    /// Walks up and swings
    #[default]
    Melee,
    /// Dashes at targets beyond swing range
    Charger,
    /// Slams, shrugs off flinches, enrages when hurt
    Brute,
    /// Holds position and watches
    Sentry,
}

impl BehaviorKind {
    pub fn moves(self) -> bool {
        self != BehaviorKind::Sentry
    }
}

/// One-time buff when health falls low
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnragePhase {
    /// Triggers at or below this health fraction
    pub health_fraction: f32,
    pub damage_multiplier: f32,
    pub speed_multiplier: f32,
}

impl Default for EnragePhase {
    fn default() -> Self {
        Self {
            health_fraction: 0.5,
            damage_multiplier: 1.5,
            speed_multiplier: 1.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesProfile {
    pub behavior: BehaviorKind,
    pub stats: CombatStats,
    pub attack_range: f32,
    pub detection_range: f32,
    pub half_extents: Vec2,
    pub abilities: Vec<AbilitySpec>,
    pub transitions: TransitionTable,
    /// Time spent in Hurt after a hit; zero means the species never flinches
    pub hurt_ms: u64,
    /// Delay between death and release to the pool
    pub death_exit_ms: u64,
    /// Radius of the route generated at spawn; `None` spawns without a route
    pub patrol_radius: Option<f32>,
    /// Overrides the global default pool capacity
    pub pool_capacity: Option<usize>,
    pub enrage: Option<EnragePhase>,
}

impl Default for SpeciesProfile {
    fn default() -> Self {
        Self {
            behavior: BehaviorKind::Melee,
            stats: CombatStats::default(),
            attack_range: 24.0,
            detection_range: 160.0,
            half_extents: Vec2::splat(8.0),
            abilities: vec![AbilitySpec::basic(1_000)],
            transitions: TransitionTable::default(),
            hurt_ms: 250,
            death_exit_ms: 600,
            patrol_radius: None,
            pool_capacity: None,
            enrage: None,
        }
    }
}

impl SpeciesProfile {
    /// Plain melee walker
    pub fn grunt() -> Self {
        Self {
            patrol_radius: Some(80.0),
            ..Default::default()
        }
    }

    pub fn charger() -> Self {
        Self {
            behavior: BehaviorKind::Charger,
            stats: CombatStats {
                max_health: 70.0,
                damage: 8.0,
                speed: 70.0,
                experience: 15,
                ..Default::default()
            },
            detection_range: 220.0,
            abilities: vec![
                AbilitySpec::basic(900),
                AbilitySpec::charge(4_000, 500, 700, 180.0),
            ],
            patrol_radius: Some(100.0),
            ..Default::default()
        }
    }

    pub fn brute() -> Self {
        Self {
            behavior: BehaviorKind::Brute,
            stats: CombatStats {
                max_health: 300.0,
                damage: 18.0,
                defense: 3.0,
                speed: 40.0,
                experience: 50,
            },
            attack_range: 30.0,
            half_extents: Vec2::splat(14.0),
            abilities: vec![AbilitySpec::basic(1_600), AbilitySpec::slam(5_000, 700, 56.0)],
            hurt_ms: 0,
            death_exit_ms: 1_200,
            pool_capacity: Some(4),
            enrage: Some(EnragePhase::default()),
            ..Default::default()
        }
    }

    /// Fallback for unknown species: holds still and never attacks
    pub fn sentry() -> Self {
        Self {
            behavior: BehaviorKind::Sentry,
            abilities: Vec::new(),
            hurt_ms: 0,
            ..Default::default()
        }
    }

    pub fn ability(&self, id: AbilityId) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|a| a.id == id)
    }

    /// Reject profiles that cannot behave sensibly
    pub fn validate(&self, species: &str) -> Result<()> {
        let invalid = |reason: String| AiError::InvalidProfile {
            species: species.to_owned(),
            reason,
        };

        let ranges = [self.attack_range, self.detection_range];
        if ranges.iter().any(|r| r.is_nan() || *r < 0.0) {
            return Err(invalid("ranges must be non-negative".into()));
        }
        if self.detection_range < self.attack_range {
            return Err(invalid(format!(
                "detection range {} is shorter than attack range {}",
                self.detection_range, self.attack_range
            )));
        }
        if self.stats.max_health <= 0.0 {
            return Err(invalid("max_health must be positive".into()));
        }
        for (i, ability) in self.abilities.iter().enumerate() {
            if self.abilities[..i].iter().any(|a| a.id == ability.id) {
                return Err(invalid(format!("ability '{}' listed twice", ability.id)));
            }
        }
        if self.pool_capacity == Some(0) {
            return Err(invalid("pool_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SpeciesFile {
    #[serde(default)]
    species: HashMap<String, SpeciesProfile>,
}

/// Profiles by species tag
#[derive(Debug, Clone)]
pub struct SpeciesTable {
    profiles: HashMap<SpeciesId, Arc<SpeciesProfile>>,
    fallback: Arc<SpeciesProfile>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            fallback: Arc::new(SpeciesProfile::sentry()),
        }
    }

    /// grunt, charger, brute and sentry
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (name, profile) in [
            ("grunt", SpeciesProfile::grunt()),
            ("charger", SpeciesProfile::charger()),
            ("brute", SpeciesProfile::brute()),
            ("sentry", SpeciesProfile::sentry()),
        ] {
            table.profiles.insert(SpeciesId::new(name), Arc::new(profile));
        }
        table
    }

    /// Parse a `[species.<name>]` table
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: SpeciesFile = toml::from_str(source)?;
        let mut table = Self::new();
        for (name, profile) in file.species {
            table.insert(SpeciesId::new(&name), profile)?;
        }
        log::info!("Loaded {} species profiles", table.len());
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn insert(&mut self, id: SpeciesId, profile: SpeciesProfile) -> Result<()> {
        profile.validate(id.as_str())?;
        self.profiles.insert(id, Arc::new(profile));
        Ok(())
    }

    pub fn get(&self, id: &SpeciesId) -> Option<Arc<SpeciesProfile>> {
        self.profiles.get(id).cloned()
    }

    /// Profile for `id`, or the sentry fallback with a warning
    pub fn resolve(&self, id: &SpeciesId) -> Arc<SpeciesProfile> {
        match self.profiles.get(id) {
            Some(profile) => Arc::clone(profile),
            None => {
                log::warn!("No profile for species '{}', falling back to sentry", id);
                Arc::clone(&self.fallback)
            }
        }
    }

    pub fn contains(&self, id: &SpeciesId) -> bool {
        self.profiles.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SpeciesId> {
        self.profiles.keys()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        let table = SpeciesTable::builtin();
        assert_eq!(table.len(), 4);
        for id in table.ids() {
            table.get(id).unwrap().validate(id.as_str()).unwrap();
        }
        let brute = table.get(&"brute".into()).unwrap();
        assert!(brute.ability(AbilityId::Slam).is_some());
        assert_eq!(brute.hurt_ms, 0);
    }

    #[test]
    fn test_unknown_species_falls_back_to_sentry() {
        let table = SpeciesTable::builtin();
        let profile = table.resolve(&SpeciesId::new("wyvern"));
        assert_eq!(profile.behavior, BehaviorKind::Sentry);
        assert!(profile.abilities.is_empty());
    }

    #[test]
    fn test_from_toml() {
        let table = SpeciesTable::from_toml_str(
            r#"
            [species.skeleton]
            behavior = "melee"
            attack_range = 20.0
            detection_range = 120.0
            stats = { max_health = 40.0, damage = 6.0 }

            [[species.skeleton.abilities]]
            id = "basic"
            cooldown_ms = 800

            [species.ram]
            behavior = "charger"
            pool_capacity = 2

            [[species.ram.abilities]]
            id = "charge"
            cooldown_ms = 3000
            windup_ms = 400
            duration_ms = 600
            range = 150.0
            "#,
        )
        .unwrap();

        let skeleton = table.get(&"skeleton".into()).unwrap();
        assert_eq!(skeleton.stats.max_health, 40.0);
        assert_eq!(skeleton.stats.speed, 60.0);
        assert_eq!(skeleton.ability(AbilityId::Basic).unwrap().cooldown_ms, 800);
        assert_eq!(skeleton.transitions, TransitionTable::default());

        let ram = table.get(&"ram".into()).unwrap();
        assert_eq!(ram.behavior, BehaviorKind::Charger);
        assert_eq!(ram.pool_capacity, Some(2));
        assert_eq!(ram.ability(AbilityId::Charge).unwrap().windup_ms, 400);
    }

    #[test]
    fn test_invalid_profile_rejected() {
        let err = SpeciesTable::from_toml_str(
            r#"
            [species.blind]
            attack_range = 50.0
            detection_range = 10.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AiError::InvalidProfile { .. }));
    }

    #[test]
    fn test_duplicate_ability_rejected() {
        let profile = SpeciesProfile {
            abilities: vec![AbilitySpec::basic(100), AbilitySpec::basic(200)],
            ..Default::default()
        };
        assert!(profile.validate("twin").is_err());
    }
}
