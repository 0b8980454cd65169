//! Combat statistics

use serde::{Deserialize, Serialize};

/// Per-agent combat numbers. Copied from the species profile at spawn and
/// mutated afterwards (enrage phases, buffs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    pub max_health: f32,
    /// Base damage of the basic attack, scaled per ability
    pub damage: f32,
    /// Flat reduction applied to incoming damage
    pub defense: f32,
    /// Movement speed in units per second
    pub speed: f32,
    /// Experience awarded on death
    pub experience: u32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            damage: 10.0,
            defense: 0.0,
            speed: 60.0,
            experience: 10,
        }
    }
}

impl CombatStats {
    /// Multiply damage and speed
    pub fn scale(&mut self, damage_multiplier: f32, speed_multiplier: f32) {
        self.damage *= damage_multiplier.max(0.0);
        self.speed *= speed_multiplier.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let mut stats = CombatStats { damage: 10.0, speed: 50.0, ..Default::default() };
        stats.scale(1.5, 2.0);
        assert_eq!(stats.damage, 15.0);
        assert_eq!(stats.speed, 100.0);

        stats.scale(-1.0, 1.0);
        assert_eq!(stats.damage, 0.0);
    }
}
