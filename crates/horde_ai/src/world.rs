//! Collaborator surfaces the AI core queries and commands
//!
//! Agents never own their physics body or the player. Each tick they read
//! positions through [`PhysicsWorld`], write a desired velocity back, and hit
//! the player through [`Target`].

use crate::agent::AgentId;
use horde_combat::{DamageType, StatusEffect};
use horde_math::{Aabb2, Vec2};
use std::collections::HashMap;

/// Physics bodies keyed by agent id
pub trait PhysicsWorld {
    fn insert_body(&mut self, body: AgentId, position: Vec2, half_extents: Vec2);
    fn remove_body(&mut self, body: AgentId);
    fn position(&self, body: AgentId) -> Option<Vec2>;
    fn bounds(&self, body: AgentId) -> Option<Aabb2>;
    /// Desired velocity in units per second
    fn set_velocity(&mut self, body: AgentId, velocity: Vec2);
}

/// The entity agents hunt
pub trait Target {
    fn position(&self) -> Vec2;
    fn bounds(&self) -> Aabb2;

    /// Multiplicative resistance for a damage type
    fn resistance(&self, _damage_type: DamageType) -> f32 {
        0.0
    }

    /// Apply already-mitigated damage, returning the amount taken
    fn take_damage(&mut self, amount: f32, damage_type: DamageType) -> f32;

    fn apply_knockback(&mut self, _impulse: Vec2) {}

    fn apply_status_effect(&mut self, _effect: StatusEffect) {}

    fn is_alive(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    half_extents: Vec2,
}

impl Body {
    fn bounds_at(&self, position: Vec2) -> Aabb2 {
        Aabb2::from_center_half_extents(position, self.half_extents)
    }
}

/// Minimal world: integrates velocities and stops bodies at static blockers
#[derive(Debug, Clone, Default)]
pub struct KinematicWorld {
    bodies: HashMap<AgentId, Body>,
    blockers: Vec<Aabb2>,
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static obstacle. A body whose next step would overlap one does
    /// not move that step.
    pub fn add_blocker(&mut self, blocker: Aabb2) {
        self.blockers.push(blocker);
    }

    pub fn step(&mut self, delta_ms: u64) {
        let dt = delta_ms as f32 / 1000.0;
        for body in self.bodies.values_mut() {
            if body.velocity.is_zero() {
                continue;
            }
            let next = body.position + body.velocity * dt;
            let next_bounds = body.bounds_at(next);
            if self.blockers.iter().any(|b| b.intersects(&next_bounds)) {
                continue;
            }
            body.position = next;
        }
    }

    pub fn velocity(&self, body: AgentId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.velocity)
    }

    /// Move a body directly
    pub fn teleport(&mut self, body: AgentId, position: Vec2) -> bool {
        match self.bodies.get_mut(&body) {
            Some(b) => {
                b.position = position;
                true
            }
            None => false,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn contains(&self, body: AgentId) -> bool {
        self.bodies.contains_key(&body)
    }
}

impl PhysicsWorld for KinematicWorld {
    fn insert_body(&mut self, body: AgentId, position: Vec2, half_extents: Vec2) {
        self.bodies.insert(
            body,
            Body {
                position,
                velocity: Vec2::ZERO,
                half_extents,
            },
        );
    }

    fn remove_body(&mut self, body: AgentId) {
        self.bodies.remove(&body);
    }

    fn position(&self, body: AgentId) -> Option<Vec2> {
        self.bodies.get(&body).map(|b| b.position)
    }

    fn bounds(&self, body: AgentId) -> Option<Aabb2> {
        self.bodies.get(&body).map(|b| b.bounds_at(b.position))
    }

    fn set_velocity(&mut self, body: AgentId, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body) {
            b.velocity = velocity;
        }
    }
}
