//! Horde AI - Enemy State Machine Runtime
//!
//! Per-instance finite-state behavior for hostile agents, driven by a single
//! cooperative tick.
//!
//! # Features
//!
//! - Distance classifier with a per-species transition table
//! - Cooldown-gated abilities with windups, resolved against a target
//! - Patrol routes with stuck detection and recovery
//! - Charger, brute and sentry specializations selected by tag
//! - Per-species slot pools with generational handles
//! - Timer tokens instead of callbacks; recycling invalidates them
//!
//! # Example
//!
//! ```ignore
//! use horde_ai::prelude::*;
//!
//! let mut spawner = Spawner::new(SpeciesTable::builtin(), AiConfig::default());
//! let mut world = KinematicWorld::new();
//! let mut events: Vec<AgentEvent> = Vec::new();
//!
//! let grunt = spawner.acquire(&"grunt".into(), Vec2::ZERO, &mut world, &mut events);
//! spawner.tick(16, 16, &mut world, &mut player, &mut events);
//! world.step(16);
//! ```

pub mod ability;
pub mod agent;
pub mod behavior;
pub mod config;
pub mod cooldown;
pub mod distance;
pub mod error;
pub mod events;
pub mod route;
pub mod spawner;
pub mod species;
pub mod state_machine;
pub mod stuck;
pub mod timer;
pub mod world;

pub mod prelude {
    pub use crate::ability::{AbilitySpec, HitReport, HitShape, Strike};
    pub use crate::agent::{Agent, AgentFlags, AgentId, TickContext};
    pub use crate::config::{AiConfig, StuckConfig};
    pub use crate::cooldown::{AbilityGate, AbilityId};
    pub use crate::error::{AiError, Result};
    pub use crate::events::{AgentEvent, EventSink, NullSink};
    pub use crate::route::PatrolRoute;
    pub use crate::spawner::{AgentHandle, Spawner};
    pub use crate::species::{BehaviorKind, EnragePhase, SpeciesId, SpeciesProfile, SpeciesTable};
    pub use crate::state_machine::{
        classify, AgentState, ClassifierInput, TransitionCause, TransitionDecision, TransitionTable,
    };
    pub use crate::stuck::{Recovery, StuckDetector, StuckOutcome};
    pub use crate::timer::{Deferred, TimerQueue, TimerToken};
    pub use crate::world::{KinematicWorld, PhysicsWorld, Target};
    pub use horde_math::{Aabb2, Vec2};
}

pub use prelude::*;
