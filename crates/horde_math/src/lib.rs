//! # horde_math - Planar Math
//!
//! The AI runtime simulates on a 2D plane. This crate holds the vector and
//! bounding-box types it measures with:
//! - `Vec2` with squared-length helpers for hot-path range checks
//! - `Aabb2` with an exact gap query for contact resolution

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bounds;
pub mod vector;

pub use bounds::*;
pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const EPSILON: f32 = 1e-6;
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp value between min and max
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min { min }
    else if value > max { max }
    else { value }
}

pub mod prelude {
    pub use crate::bounds::Aabb2;
    pub use crate::vector::Vec2;
    pub use crate::{clamp, lerp};
}
