//! Scripted player the horde hunts
//!
//! Walks a looping path, takes hits through [`Target`], and swings back at
//! any agent close enough on a fixed interval.

use crate::sim_config::PlayerConfig;
use horde_ai::prelude::*;
use horde_combat::{DamageType, Health, Resistances, StatusEffect, StatusEffects};

/// Fraction of knockback velocity shed per second
const KNOCKBACK_DAMPING_PER_SEC: f32 = 6.0;

pub struct Player {
    position: Vec2,
    half_extents: Vec2,
    speed: f32,
    path: Vec<Vec2>,
    path_index: usize,
    health: Health,
    resistances: Resistances,
    effects: StatusEffects,
    knockback: Vec2,
    now_ms: u64,
    damage_taken: f32,
    hits_taken: u32,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            position: config.position,
            half_extents: config.half_extents,
            speed: config.speed,
            path: config.path.clone(),
            path_index: 0,
            health: Health::new(config.max_health),
            resistances: Resistances::new().with(DamageType::Physical, config.armor),
            effects: StatusEffects::new(),
            knockback: Vec2::ZERO,
            now_ms: 0,
            damage_taken: 0.0,
            hits_taken: 0,
        }
    }

    /// Advance the player's own movement
    pub fn update(&mut self, now_ms: u64, delta_ms: u64) {
        self.now_ms = now_ms;
        self.effects.update(now_ms);
        let dt = delta_ms as f32 / 1000.0;

        if !self.knockback.is_zero() {
            self.position += self.knockback * dt;
            let decay = (1.0 - KNOCKBACK_DAMPING_PER_SEC * dt).max(0.0);
            self.knockback *= decay;
            if self.knockback.length_squared() < 1.0 {
                self.knockback = Vec2::ZERO;
            }
        }

        if self.health.is_dead() || self.effects.is_stunned(now_ms) || self.path.is_empty() {
            return;
        }

        let waypoint = self.path[self.path_index];
        let step = self.speed * self.effects.speed_multiplier(now_ms) * dt;
        let remaining = self.position.distance(waypoint);
        if remaining <= step {
            self.position = waypoint;
            self.path_index = (self.path_index + 1) % self.path.len();
        } else {
            self.position += self.position.direction_to(waypoint) * step;
        }
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn damage_taken(&self) -> f32 {
        self.damage_taken
    }

    pub fn hits_taken(&self) -> u32 {
        self.hits_taken
    }

    pub fn is_stunned(&self) -> bool {
        self.effects.is_stunned(self.now_ms)
    }
}

impl Target for Player {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn bounds(&self) -> Aabb2 {
        Aabb2::from_center_half_extents(self.position, self.half_extents)
    }

    fn resistance(&self, damage_type: DamageType) -> f32 {
        self.resistances.get(damage_type)
    }

    fn take_damage(&mut self, amount: f32, damage_type: DamageType) -> f32 {
        let outcome = self.health.apply_damage(amount);
        self.hits_taken += 1;
        self.damage_taken += outcome.applied;
        log::debug!(
            "Player took {:.1} {:?} damage ({:.0}/{:.0})",
            outcome.applied,
            damage_type,
            self.health.current(),
            self.health.max()
        );
        if outcome.died {
            log::warn!("Player died at {}ms", self.now_ms);
        }
        outcome.applied
    }

    fn apply_knockback(&mut self, impulse: Vec2) {
        self.knockback += impulse;
    }

    fn apply_status_effect(&mut self, effect: StatusEffect) {
        log::debug!("Player afflicted with {:?} for {}ms", effect.kind, effect.duration_ms);
        self.effects.apply(effect, self.now_ms);
    }

    fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}
