//! Pooled spawn, tick and release of agents
//!
//! One [`SlotPool`] per species, created the first time the species is
//! spawned. Pools are independent: filling one never affects another.
//! Handles are generational, so a handle kept past `release` is rejected
//! instead of reaching whichever agent reuses the slot.

use crate::agent::{Agent, SpawnParams, TickContext};
use crate::config::AiConfig;
use crate::error::{AiError, Result};
use crate::events::{AgentEvent, EventSink};
use crate::species::{SpeciesId, SpeciesProfile, SpeciesTable};
use crate::world::{PhysicsWorld, Target};
use horde_core::{Handle, HandleError, IdGenerator};
use horde_math::{consts::TAU, Vec2};
use horde_memory::{PoolStats, SlotPool};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Handle to a pooled agent
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AgentHandle {
    pool: u16,
    slot: Handle<Agent>,
}

impl AgentHandle {
    pub fn pool_index(&self) -> u16 {
        self.pool
    }

    pub fn slot(&self) -> Handle<Agent> {
        self.slot
    }
}

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pool, self.slot)
    }
}

struct SpeciesPool {
    species: SpeciesId,
    profile: Arc<SpeciesProfile>,
    slots: SlotPool<Agent>,
}

/// Owns every agent and drives them each tick
pub struct Spawner {
    species: SpeciesTable,
    config: AiConfig,
    pools: Vec<SpeciesPool>,
    pool_lookup: HashMap<SpeciesId, u16>,
    ids: IdGenerator,
    rng: SmallRng,
    /// Reused every tick
    scratch: Vec<Handle<Agent>>,
    clock_ms: u64,
}

impl Spawner {
    pub fn new(species: SpeciesTable, config: AiConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            species,
            config,
            pools: Vec::new(),
            pool_lookup: HashMap::new(),
            ids: IdGenerator::new(),
            rng,
            scratch: Vec::new(),
            clock_ms: 0,
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn species_table(&self) -> &SpeciesTable {
        &self.species
    }

    /// Current spawner time; spawns are stamped with it
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    /// Move the clock forward before spawning between ticks. Never moves back.
    pub fn advance_clock(&mut self, now_ms: u64) {
        self.clock_ms = self.clock_ms.max(now_ms);
    }

    /// Spawn an agent, logging and returning `None` when its pool is full.
    ///
    /// The agent is stamped with [`Spawner::clock_ms`], which is the time of
    /// the last `tick` unless [`Spawner::advance_clock`] moved it since.
    pub fn acquire(
        &mut self,
        species: &SpeciesId,
        position: Vec2,
        world: &mut dyn PhysicsWorld,
        events: &mut dyn EventSink,
    ) -> Option<AgentHandle> {
        match self.try_acquire(species, position, world, events) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("Spawn refused: {}", err);
                None
            }
        }
    }

    /// Spawn an agent, reusing a released slot of the same species if any
    pub fn try_acquire(
        &mut self,
        species: &SpeciesId,
        position: Vec2,
        world: &mut dyn PhysicsWorld,
        events: &mut dyn EventSink,
    ) -> Result<AgentHandle> {
        let pool_index = self.pool_for(species);
        let pool = &mut self.pools[pool_index as usize];
        if pool.slots.is_full() {
            return Err(AiError::PoolExhausted {
                species: species.clone(),
                capacity: pool.slots.capacity(),
            });
        }

        let params = SpawnParams {
            id: self.ids.next(),
            position,
            now_ms: self.clock_ms,
            route_phase: self.rng.gen_range(0.0..TAU),
        };
        let config = &self.config;
        let profile = Arc::clone(&pool.profile);
        let pool_species = pool.species.clone();

        let slot = pool
            .slots
            .acquire_with(
                || Agent::spawn(pool_species, profile, pool_index, &params, config),
                |agent| agent.respawn(&params, config),
            )
            .ok_or_else(|| AiError::PoolExhausted {
                species: species.clone(),
                capacity: pool.slots.capacity(),
            })?;

        let handle = AgentHandle {
            pool: pool_index,
            slot,
        };
        world.insert_body(params.id, position, pool.profile.half_extents);
        events.emit(AgentEvent::Spawned {
            agent: params.id,
            species: pool.species.clone(),
            position,
        });
        log::debug!("Spawned {} agent {} as {}", pool.species, params.id, handle);
        Ok(handle)
    }

    /// Index of the species' pool, creating it on first use
    fn pool_for(&mut self, species: &SpeciesId) -> u16 {
        if let Some(&index) = self.pool_lookup.get(species) {
            return index;
        }
        let profile = self.species.resolve(species);
        let capacity = profile
            .pool_capacity
            .unwrap_or(self.config.default_pool_capacity);
        let index = self.pools.len() as u16;
        self.pools.push(SpeciesPool {
            species: species.clone(),
            profile,
            slots: SlotPool::with_capacity(capacity),
        });
        self.pool_lookup.insert(species.clone(), index);
        log::info!("Created pool for '{}' with capacity {}", species, capacity);
        index
    }

    /// Deactivate an agent and return its slot. Stale handles return false.
    pub fn release(
        &mut self,
        handle: AgentHandle,
        world: &mut dyn PhysicsWorld,
        events: &mut dyn EventSink,
    ) -> bool {
        let Some(pool) = self.pools.get_mut(handle.pool as usize) else {
            return false;
        };
        if let Err(reason) = pool.slots.try_get(handle.slot) {
            log::debug!("Ignoring release of {}: {}", handle, reason);
            return false;
        }
        let Some(agent) = pool.slots.release(handle.slot) else {
            return false;
        };
        let id = agent.id();
        agent.deactivate();
        world.remove_body(id);
        events.emit(AgentEvent::Released { agent: id });
        log::debug!("Released agent {} ({})", id, handle);
        true
    }

    /// Update every live agent in pool order, then slot order. Agents whose
    /// death exit has finished are released.
    pub fn tick(
        &mut self,
        now_ms: u64,
        delta_ms: u64,
        world: &mut dyn PhysicsWorld,
        target: &mut dyn Target,
        events: &mut dyn EventSink,
    ) {
        self.clock_ms = now_ms;
        log::trace!("Tick at {}ms (+{}ms), {} active", now_ms, delta_ms, self.active_count());

        for pool_index in 0..self.pools.len() {
            self.pools[pool_index].slots.collect_live(&mut self.scratch);

            for i in 0..self.scratch.len() {
                let slot = self.scratch[i];
                let finished = {
                    let Some(agent) = self.pools[pool_index].slots.get_mut(slot) else {
                        continue;
                    };
                    let mut ctx = TickContext {
                        world: &mut *world,
                        target: &mut *target,
                        events: &mut *events,
                        rng: &mut self.rng,
                        config: &self.config,
                    };
                    agent.update(now_ms, &mut ctx);
                    agent.exit_complete()
                };

                if finished {
                    let handle = AgentHandle {
                        pool: pool_index as u16,
                        slot,
                    };
                    self.release(handle, world, events);
                }
            }
        }
    }

    pub fn get(&self, handle: AgentHandle) -> Option<&Agent> {
        self.try_get(handle).ok()
    }

    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        self.try_get_mut(handle).ok()
    }

    /// Resolve a handle, reporting why it is no longer valid
    pub fn try_get(&self, handle: AgentHandle) -> Result<&Agent> {
        self.pools
            .get(handle.pool as usize)
            .ok_or(HandleError::OutOfBounds)
            .and_then(|pool| pool.slots.try_get(handle.slot))
            .map_err(|reason| AiError::StaleHandle { handle, reason })
    }

    pub fn try_get_mut(&mut self, handle: AgentHandle) -> Result<&mut Agent> {
        self.pools
            .get_mut(handle.pool as usize)
            .ok_or(HandleError::OutOfBounds)
            .and_then(|pool| pool.slots.try_get_mut(handle.slot))
            .map_err(|reason| AiError::StaleHandle { handle, reason })
    }

    pub fn contains(&self, handle: AgentHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Damage an agent. `None` for stale handles.
    pub fn take_damage(
        &mut self,
        handle: AgentHandle,
        amount: f32,
        events: &mut dyn EventSink,
    ) -> Option<f32> {
        Some(self.get_mut(handle)?.take_damage(amount, events))
    }

    pub fn stun(&mut self, handle: AgentHandle, duration_ms: u64, events: &mut dyn EventSink) -> bool {
        self.get_mut(handle)
            .is_some_and(|agent| agent.apply_stun(duration_ms, events))
    }

    pub fn set_patrol_route(&mut self, handle: AgentHandle, waypoints: &[Vec2]) -> bool {
        match self.get_mut(handle) {
            Some(agent) => {
                agent.set_patrol_route(waypoints.iter().copied());
                true
            }
            None => false,
        }
    }

    /// Write every live handle into `out` (cleared first)
    pub fn handles(&self, out: &mut Vec<AgentHandle>) {
        out.clear();
        for (index, pool) in self.pools.iter().enumerate() {
            out.extend(pool.slots.iter().map(|(slot, _)| AgentHandle {
                pool: index as u16,
                slot,
            }));
        }
    }

    pub fn active_count(&self) -> usize {
        self.pools.iter().map(|p| p.slots.len()).sum()
    }

    pub fn pool_stats(&self, species: &SpeciesId) -> Option<PoolStats> {
        let &index = self.pool_lookup.get(species)?;
        Some(self.pools[index as usize].slots.stats())
    }
}
