//! Ability definitions and hit resolution

use crate::cooldown::AbilityId;
use crate::world::Target;
use horde_combat::{knockback_impulse, mitigate, DamageType, StatusEffect};
use horde_math::{Aabb2, Vec2};
use serde::{Deserialize, Serialize};

/// How an ability decides whether it connected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HitShape {
    /// Bounding boxes must touch
    Contact,
    /// Target center within `radius` of the source center
    Radius { radius: f32 },
}

impl Default for HitShape {
    fn default() -> Self {
        HitShape::Contact
    }
}

/// Static definition of one ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilitySpec {
    pub id: AbilityId,
    pub cooldown_ms: u64,
    /// Telegraph before the effect; zero resolves immediately
    pub windup_ms: u64,
    /// Active time after the windup (charge dash length)
    pub duration_ms: u64,
    /// Activation range; zero means the species attack range
    pub range: f32,
    pub hit: HitShape,
    /// Multiplier on the agent's base damage
    pub damage_scale: f32,
    pub damage_type: DamageType,
    pub knockback: f32,
    pub status: Option<StatusEffect>,
    /// Multiplier on movement speed while active
    pub speed_scale: f32,
}

impl Default for AbilitySpec {
    fn default() -> Self {
        Self {
            id: AbilityId::Basic,
            cooldown_ms: 1_000,
            windup_ms: 0,
            duration_ms: 0,
            range: 0.0,
            hit: HitShape::Contact,
            damage_scale: 1.0,
            damage_type: DamageType::Physical,
            knockback: 0.0,
            status: None,
            speed_scale: 1.0,
        }
    }
}

impl AbilitySpec {
    pub fn basic(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            ..Default::default()
        }
    }

    pub fn charge(cooldown_ms: u64, windup_ms: u64, duration_ms: u64, range: f32) -> Self {
        Self {
            id: AbilityId::Charge,
            cooldown_ms,
            windup_ms,
            duration_ms,
            range,
            damage_scale: 2.0,
            knockback: 240.0,
            speed_scale: 3.5,
            ..Default::default()
        }
    }

    pub fn slam(cooldown_ms: u64, windup_ms: u64, radius: f32) -> Self {
        Self {
            id: AbilityId::Slam,
            cooldown_ms,
            windup_ms,
            range: radius,
            hit: HitShape::Radius { radius },
            damage_scale: 1.5,
            knockback: 160.0,
            status: Some(StatusEffect::stun(800)),
            ..Default::default()
        }
    }

    /// Activation range, falling back to the species attack range
    pub fn effective_range(&self, attack_range: f32) -> f32 {
        if self.range > 0.0 {
            self.range
        } else {
            attack_range
        }
    }
}

/// The attacking side of a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub position: Vec2,
    pub bounds: Aabb2,
    pub facing: Vec2,
    pub base_damage: f32,
}

/// What a connecting hit did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitReport {
    /// Damage after resistance, as passed to the target
    pub amount: f32,
    /// Damage the target reported taking
    pub applied: f32,
    pub knockback: Vec2,
}

/// Geometric hit test only
pub fn connects(shape: HitShape, strike: &Strike, target: &dyn Target) -> bool {
    match shape {
        HitShape::Contact => strike.bounds.gap(&target.bounds()) <= 0.0,
        HitShape::Radius { radius } => {
            strike.position.distance_squared(target.position()) <= radius * radius
        }
    }
}

/// Resolve one ability use against the target.
///
/// On a hit the target's `take_damage` runs exactly once. A miss changes
/// nothing and returns `None`.
pub fn resolve(spec: &AbilitySpec, strike: &Strike, target: &mut dyn Target) -> Option<HitReport> {
    if !target.is_alive() {
        return None;
    }
    if !connects(spec.hit, strike, target) {
        log::debug!("{} missed", spec.id);
        return None;
    }

    let raw = strike.base_damage * spec.damage_scale;
    let amount = mitigate(raw, target.resistance(spec.damage_type));
    let applied = target.take_damage(amount, spec.damage_type);

    let knockback = knockback_impulse(strike.position, target.position(), spec.knockback, strike.facing);
    if !knockback.is_zero() {
        target.apply_knockback(knockback);
    }
    if let Some(effect) = spec.status {
        target.apply_status_effect(effect);
    }

    Some(HitReport {
        amount,
        applied,
        knockback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use horde_combat::StatusKind;

    #[derive(Default)]
    struct Dummy {
        position: Vec2,
        resist: f32,
        hits: Vec<(f32, DamageType)>,
        knockback: Vec2,
        effects: Vec<StatusEffect>,
    }

    impl Target for Dummy {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn bounds(&self) -> Aabb2 {
            Aabb2::from_center_half_extents(self.position, Vec2::splat(5.0))
        }

        fn resistance(&self, damage_type: DamageType) -> f32 {
            if damage_type == DamageType::True {
                0.0
            } else {
                self.resist
            }
        }

        fn take_damage(&mut self, amount: f32, damage_type: DamageType) -> f32 {
            self.hits.push((amount, damage_type));
            amount
        }

        fn apply_knockback(&mut self, impulse: Vec2) {
            self.knockback += impulse;
        }

        fn apply_status_effect(&mut self, effect: StatusEffect) {
            self.effects.push(effect);
        }
    }

    fn strike_at(position: Vec2) -> Strike {
        Strike {
            position,
            bounds: Aabb2::from_center_half_extents(position, Vec2::splat(5.0)),
            facing: Vec2::X,
            base_damage: 20.0,
        }
    }

    #[test]
    fn test_contact_hit_applies_mitigated_damage_once() {
        let mut target = Dummy {
            resist: 0.25,
            ..Default::default()
        };
        let report = resolve(&AbilitySpec::basic(500), &strike_at(Vec2::ZERO), &mut target).unwrap();
        assert_eq!(target.hits.len(), 1);
        assert_relative_eq!(target.hits[0].0, 15.0);
        assert_relative_eq!(report.amount, 15.0);
    }

    #[test]
    fn test_contact_miss_is_silent() {
        let mut target = Dummy {
            position: Vec2::new(30.0, 0.0),
            ..Default::default()
        };
        assert!(resolve(&AbilitySpec::basic(500), &strike_at(Vec2::ZERO), &mut target).is_none());
        assert!(target.hits.is_empty());
        assert!(target.knockback.is_zero());
    }

    #[test]
    fn test_radius_hit_with_knockback_and_stun() {
        let mut target = Dummy {
            position: Vec2::new(0.0, 40.0),
            ..Default::default()
        };
        let slam = AbilitySpec::slam(5_000, 600, 48.0);
        let report = resolve(&slam, &strike_at(Vec2::ZERO), &mut target).unwrap();
        assert_relative_eq!(report.amount, 30.0);
        assert_relative_eq!(target.knockback.y, 160.0);
        assert_eq!(target.effects.len(), 1);
        assert_eq!(target.effects[0].kind, StatusKind::Stun);
    }

    #[test]
    fn test_spec_from_toml() {
        let spec: AbilitySpec = toml::from_str(
            r#"
            id = "slam"
            cooldown_ms = 4000
            hit = { type = "radius", radius = 60.0 }
            damage_type = "fire"
            status = { kind = "slow", duration_ms = 1500, magnitude = 0.5 }
            "#,
        )
        .unwrap();
        assert_eq!(spec.id, AbilityId::Slam);
        assert_eq!(spec.hit, HitShape::Radius { radius: 60.0 });
        assert_eq!(spec.damage_type, DamageType::Fire);
        assert_eq!(spec.windup_ms, 0);
        assert_eq!(spec.status.map(|s| s.kind), Some(StatusKind::Slow));
        assert_eq!(spec.effective_range(25.0), 25.0);
    }
}
