//! Clamped health pool

use serde::{Deserialize, Serialize};

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DamageOutcome {
    /// Health actually removed
    pub applied: f32,
    /// True only for the hit that brought health to zero
    pub died: bool,
}

/// Health that stays within `[0, max]` and dies exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
    #[serde(skip)]
    dead: bool,
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            dead: max <= 0.0,
        }
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> f32 {
        self.max
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Health as a fraction (0.0 - 1.0)
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        self.current / self.max
    }

    /// Remove health. Damage to a dead pool is ignored.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || amount.is_nan() || amount <= 0.0 {
            return DamageOutcome::default();
        }

        let applied = amount.min(self.current);
        self.current -= applied;
        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            return DamageOutcome { applied, died: true };
        }
        DamageOutcome { applied, died: false }
    }

    /// Restore health, returning the amount healed. The dead stay dead.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Change the maximum, keeping the current fraction
    pub fn set_max(&mut self, max: f32) {
        let fraction = self.fraction();
        self.max = max.max(0.0);
        if !self.dead {
            self.current = (self.max * fraction).clamp(0.0, self.max);
        }
    }

    /// Back to full and alive
    pub fn reset(&mut self, max: f32) {
        *self = Self::new(max);
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero_and_dies_once() {
        let mut health = Health::new(50.0);

        let first = health.apply_damage(30.0);
        assert_eq!(first, DamageOutcome { applied: 30.0, died: false });

        let killing = health.apply_damage(100.0);
        assert_eq!(killing.applied, 20.0);
        assert!(killing.died);
        assert_eq!(health.current(), 0.0);

        let after = health.apply_damage(10.0);
        assert_eq!(after, DamageOutcome::default());
        assert_eq!(health.current(), 0.0);
    }

    #[test]
    fn test_negative_and_nan_damage_ignored() {
        let mut health = Health::new(10.0);
        assert_eq!(health.apply_damage(-5.0).applied, 0.0);
        assert_eq!(health.apply_damage(f32::NAN).applied, 0.0);
        assert_eq!(health.current(), 10.0);
    }

    #[test]
    fn test_healing_caps_at_max() {
        let mut health = Health::new(100.0);
        health.apply_damage(50.0);
        assert_eq!(health.heal(30.0), 30.0);
        assert_eq!(health.heal(50.0), 20.0);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn test_set_max_keeps_fraction() {
        let mut health = Health::new(100.0);
        health.apply_damage(50.0);
        health.set_max(200.0);
        assert_eq!(health.current(), 100.0);
        assert_eq!(health.fraction(), 0.5);

        health.reset(80.0);
        assert_eq!(health.current(), 80.0);
        assert!(health.is_alive());
    }
}
