//! Horde Combat - Health, Damage, Status Effects
//!
//! Combat bookkeeping shared by hostile agents and the things they hit.
//!
//! # Features
//!
//! - Clamped health that dies exactly once
//! - Damage types with multiplicative resistances
//! - Flat defense mitigation
//! - Timed status effects (stun, slow)
//! - Knockback impulses
//!
//! # Example
//!
//! ```ignore
//! use horde_combat::prelude::*;
//!
//! let mut health = Health::new(100.0);
//! let resist = Resistances::new().with(DamageType::Fire, 0.5);
//! let amount = mitigate(40.0, resist.get(DamageType::Fire)); // 20.0
//! let outcome = health.apply_damage(amount);
//! assert!(!outcome.died);
//! ```

pub mod damage;
pub mod health;
pub mod knockback;
pub mod stats;
pub mod status;

pub mod prelude {
    pub use crate::damage::{mitigate, mitigate_flat, DamageType, Resistances};
    pub use crate::health::{DamageOutcome, Health};
    pub use crate::knockback::knockback_impulse;
    pub use crate::stats::CombatStats;
    pub use crate::status::{StatusEffect, StatusEffects, StatusKind};
}

pub use prelude::*;
