//! Range measurements
//!
//! State selection compares squared center distances; only contact hits pay
//! for the exact box gap.

use crate::world::Target;
use horde_math::{Aabb2, Vec2};

/// Where the target is, measured once per agent update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetReading {
    pub position: Vec2,
    /// Infinite when the target is dead
    pub distance_sq: f32,
}

impl TargetReading {
    pub fn measure(from: Vec2, target: &dyn Target) -> Self {
        let position = target.position();
        let distance_sq = if target.is_alive() {
            from.distance_squared(position)
        } else {
            f32::INFINITY
        };
        Self { position, distance_sq }
    }

    #[inline]
    pub fn within(&self, range: f32) -> bool {
        within(self.distance_sq, range)
    }
}

#[inline]
pub fn within(distance_sq: f32, range: f32) -> bool {
    distance_sq <= range * range
}

/// Exact separation between two boxes, zero when touching
#[inline]
pub fn gap(a: &Aabb2, b: &Aabb2) -> f32 {
    a.gap(b)
}

#[inline]
pub fn in_contact(a: &Aabb2, b: &Aabb2) -> bool {
    gap(a, b) <= 0.0
}
