//! Damage types and mitigation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Types of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    /// Claws, tusks, blunt impacts
    #[default]
    Physical,
    Fire,
    Ice,
    Poison,
    /// Ignores all resistances
    True,
}

/// Multiplicative resistance fractions per damage type.
///
/// `0.0` takes full damage, `0.5` halves it, `1.0` (or more) negates it.
/// Negative values amplify.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resistances {
    values: HashMap<DamageType, f32>,
}

impl Resistances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, damage_type: DamageType, fraction: f32) -> Self {
        self.set(damage_type, fraction);
        self
    }

    pub fn set(&mut self, damage_type: DamageType, fraction: f32) {
        self.values.insert(damage_type, fraction);
    }

    /// Resistance for a damage type; `True` damage always reports zero
    pub fn get(&self, damage_type: DamageType) -> f32 {
        if damage_type == DamageType::True {
            return 0.0;
        }
        self.values.get(&damage_type).copied().unwrap_or(0.0)
    }
}

/// Apply a multiplicative resistance; negative resistance never amplifies
/// and the result never goes below zero
#[inline]
pub fn mitigate(amount: f32, resistance: f32) -> f32 {
    (amount * (1.0 - resistance.max(0.0))).max(0.0)
}

/// Apply a flat defense value; the result never goes below zero
#[inline]
pub fn mitigate_flat(amount: f32, defense: f32) -> f32 {
    (amount - defense.max(0.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mitigate_is_multiplicative_and_clamped() {
        assert_relative_eq!(mitigate(40.0, 0.25), 30.0);
        assert_eq!(mitigate(40.0, 1.5), 0.0);
        assert_eq!(mitigate(10.0, -0.5), 10.0);
        assert_eq!(mitigate(10.0, f32::NEG_INFINITY), 10.0);
    }

    #[test]
    fn test_flat_defense() {
        assert_eq!(mitigate_flat(10.0, 3.0), 7.0);
        assert_eq!(mitigate_flat(2.0, 3.0), 0.0);
        assert_eq!(mitigate_flat(2.0, -3.0), 2.0);
    }

    #[test]
    fn test_true_damage_ignores_resistance() {
        let resist = Resistances::new()
            .with(DamageType::Fire, 0.5)
            .with(DamageType::True, 0.9);
        assert_eq!(resist.get(DamageType::Fire), 0.5);
        assert_eq!(resist.get(DamageType::Ice), 0.0);
        assert_eq!(resist.get(DamageType::True), 0.0);
    }
}
