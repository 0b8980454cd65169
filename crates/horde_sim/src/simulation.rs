//! Fixed-step encounter loop
//!
//! Each step, in order: spawn due groups, move the player, let the player
//! swing, tick every agent, integrate the world, then deliver queued events
//! to the bus subscribers.

use crate::player::Player;
use crate::sim_config::{SimConfig, SimError};
use horde_ai::prelude::*;
use horde_event::{EventBus, Priority};
use parking_lot::Mutex;
use std::sync::Arc;
use std::result::Result;

/// Event tallies kept by bus subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub spawned: u32,
    pub released: u32,
    pub deaths: u32,
    pub experience: u32,
    pub state_changes: u32,
    pub abilities_started: u32,
    pub abilities_stopped: u32,
    pub enraged: u32,
    /// Entries into each state, indexed by `AgentState::ALL` order
    pub entered: [u32; AgentState::COUNT],
}

impl SimStats {
    fn record(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::Spawned { .. } => self.spawned += 1,
            AgentEvent::StateChanged { to, .. } => {
                self.state_changes += 1;
                if let Some(index) = AgentState::ALL.iter().position(|s| s == to) {
                    self.entered[index] += 1;
                }
            }
            AgentEvent::AbilityStarted { .. } => self.abilities_started += 1,
            AgentEvent::AbilityStopped { .. } => self.abilities_stopped += 1,
            AgentEvent::Enraged { .. } => self.enraged += 1,
            AgentEvent::Death { experience, .. } => {
                self.deaths += 1;
                self.experience += experience;
            }
            AgentEvent::Released { .. } => self.released += 1,
        }
    }

    pub fn entered(&self, state: AgentState) -> u32 {
        AgentState::ALL
            .iter()
            .position(|s| *s == state)
            .map_or(0, |index| self.entered[index])
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub stats: SimStats,
    pub active_agents: usize,
    pub spawn_failures: u32,
    pub player_alive: bool,
    pub player_health: f32,
    pub player_damage_taken: f32,
    pub player_hits_taken: u32,
    pub player_hits_dealt: u32,
}

impl SimReport {
    pub fn print_summary(&self) {
        log::info!("Simulation finished:");
        log::info!("  {} ticks, {}ms simulated", self.ticks, self.elapsed_ms);
        log::info!(
            "  Agents: {} spawned, {} died, {} released, {} still active, {} refused",
            self.stats.spawned,
            self.stats.deaths,
            self.stats.released,
            self.active_agents,
            self.spawn_failures
        );
        log::info!(
            "  Abilities: {} started, {} stopped; {} enraged",
            self.stats.abilities_started,
            self.stats.abilities_stopped,
            self.stats.enraged
        );
        for state in AgentState::ALL {
            let count = self.stats.entered(state);
            if count > 0 {
                log::info!("    entered {:<8} {}", state, count);
            }
        }
        log::info!(
            "  Player: {} ({:.0} hp), took {:.1} damage in {} hits, landed {} hits",
            if self.player_alive { "alive" } else { "dead" },
            self.player_health,
            self.player_damage_taken,
            self.player_hits_taken,
            self.player_hits_dealt
        );
        log::info!("  Experience earned: {}", self.stats.experience);
    }
}

pub struct Simulation {
    config: SimConfig,
    spawner: Spawner,
    world: KinematicWorld,
    player: Player,
    bus: EventBus,
    stats: Arc<Mutex<SimStats>>,
    next_group: usize,
    now_ms: u64,
    ticks: u64,
    next_player_attack_ms: u64,
    player_hits_dealt: u32,
    spawn_failures: u32,
    handles: Vec<AgentHandle>,
}

impl Simulation {
    pub fn new(mut config: SimConfig) -> Result<Self, SimError> {
        let species = config.species_table()?;
        config.spawns.sort_by_key(|group| group.at_ms);

        let mut world = KinematicWorld::new();
        for blocker in &config.blockers {
            world.add_blocker(blocker.bounds());
        }

        let stats = Arc::new(Mutex::new(SimStats::default()));
        let mut bus = EventBus::new();
        let tally = Arc::clone(&stats);
        bus.subscribe::<AgentEvent, _>(move |event| tally.lock().record(event));
        bus.subscribe_with_priority::<AgentEvent, _>(
            |event| match event {
                AgentEvent::Death { agent, position, .. } => {
                    log::info!("Agent {} died at ({:.0}, {:.0})", agent, position.x, position.y)
                }
                AgentEvent::Enraged { agent } => log::info!("Agent {} enraged", agent),
                other => log::trace!("{:?}", other),
            },
            Priority::High,
        );

        Ok(Self {
            spawner: Spawner::new(species, config.ai.clone()),
            player: Player::new(&config.player),
            config,
            world,
            bus,
            stats,
            next_group: 0,
            now_ms: 0,
            ticks: 0,
            next_player_attack_ms: 0,
            player_hits_dealt: 0,
            spawn_failures: 0,
            handles: Vec::new(),
        })
    }

    /// Run the configured number of ticks, stopping early if the player dies
    pub fn run(&mut self) -> SimReport {
        for _ in 0..self.config.ticks {
            self.step();
            if !self.player.is_alive() {
                log::warn!("Player down after {}ms, ending run", self.now_ms);
                break;
            }
        }
        self.report()
    }

    pub fn step(&mut self) {
        let now = self.now_ms;
        let delta = self.config.tick_ms;

        self.spawn_due(now);
        self.player.update(now, delta);
        self.player_attack(now);
        self.spawner
            .tick(now, delta, &mut self.world, &mut self.player, &mut self.bus);
        self.world.step(delta);
        self.bus.process();

        self.now_ms += delta;
        self.ticks += 1;
    }

    fn spawn_due(&mut self, now: u64) {
        while let Some(group) = self.config.spawns.get(self.next_group) {
            if group.at_ms > now {
                break;
            }
            self.next_group += 1;
            self.spawner.advance_clock(now);

            let species = SpeciesId::new(&group.species);
            for i in 0..group.count {
                let position = group.position + Vec2::X * (group.spacing * i as f32);
                let Some(handle) =
                    self.spawner
                        .acquire(&species, position, &mut self.world, &mut self.bus)
                else {
                    self.spawn_failures += 1;
                    continue;
                };
                if !group.route.is_empty() {
                    self.spawner.set_patrol_route(handle, &group.route);
                }
            }
        }
    }

    fn player_attack(&mut self, now: u64) {
        let attack = &self.config.player;
        if attack.attack_interval_ms == 0 || !self.player.is_alive() || now < self.next_player_attack_ms {
            return;
        }

        let origin = self.player.position();
        let radius_sq = attack.attack_radius * attack.attack_radius;
        self.spawner.handles(&mut self.handles);
        self.handles.retain(|&handle| {
            self.spawner.get(handle).is_some_and(|agent| {
                !agent.is_dead() && agent.position().distance_squared(origin) <= radius_sq
            })
        });
        if self.handles.is_empty() {
            return;
        }

        self.next_player_attack_ms = now + attack.attack_interval_ms;
        for &handle in &self.handles {
            self.spawner.take_damage(handle, attack.attack_damage, &mut self.bus);
            if attack.stun_ms > 0 {
                self.spawner.stun(handle, attack.stun_ms, &mut self.bus);
            }
            self.player_hits_dealt += 1;
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn stats(&self) -> SimStats {
        self.stats.lock().clone()
    }

    pub fn report(&self) -> SimReport {
        SimReport {
            ticks: self.ticks,
            elapsed_ms: self.now_ms,
            stats: self.stats(),
            active_agents: self.spawner.active_count(),
            spawn_failures: self.spawn_failures,
            player_alive: self.player.is_alive(),
            player_health: self.player.health().current(),
            player_damage_taken: self.player.damage_taken(),
            player_hits_taken: self.player.hits_taken(),
            player_hits_dealt: self.player_hits_dealt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim_config::{PlayerConfig, SpawnGroup};

    fn duel(species: &str, attack_interval_ms: u64) -> SimConfig {
        SimConfig {
            ticks: 300,
            player: PlayerConfig {
                path: Vec::new(),
                attack_interval_ms,
                max_health: 10_000.0,
                ..PlayerConfig::default()
            },
            spawns: vec![SpawnGroup {
                species: species.to_owned(),
                position: Vec2::new(20.0, 0.0),
                ..SpawnGroup::default()
            }],
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let first = Simulation::new(SimConfig::default()).unwrap().run();
        let second = Simulation::new(SimConfig::default()).unwrap().run();
        assert_eq!(first, second);
        assert_eq!(first.stats.spawned, 5);
    }

    #[test]
    fn test_idle_player_gets_hit() {
        let mut sim = Simulation::new(duel("grunt", 0)).unwrap();
        let report = sim.run();
        assert!(report.player_hits_taken > 0);
        assert!(report.player_damage_taken > 0.0);
        assert_eq!(report.player_hits_dealt, 0);
        assert_eq!(report.stats.deaths, 0);
        assert_eq!(report.active_agents, 1);
        assert!(report.stats.entered(AgentState::Attack) > 0);
    }

    #[test]
    fn test_player_kills_grunt_and_slot_is_released() {
        let mut sim = Simulation::new(duel("grunt", 800)).unwrap();
        let report = sim.run();

        assert_eq!(report.stats.spawned, 1);
        assert_eq!(report.stats.deaths, 1);
        assert_eq!(report.stats.released, 1);
        assert_eq!(
            report.stats.experience,
            SpeciesProfile::grunt().stats.experience
        );
        assert_eq!(report.active_agents, 0);
        assert_eq!(report.player_hits_dealt, 4);
        assert_eq!(report.stats.entered(AgentState::Die), 1);
    }

    #[test]
    fn test_groups_spawn_on_schedule_and_respect_caps() {
        let mut config = duel("brute", 0);
        config.spawns = vec![
            SpawnGroup {
                species: "brute".to_owned(),
                position: Vec2::new(400.0, 400.0),
                count: 6,
                at_ms: 160,
                ..SpawnGroup::default()
            },
            SpawnGroup {
                species: "grunt".to_owned(),
                position: Vec2::new(-400.0, 400.0),
                count: 2,
                ..SpawnGroup::default()
            },
        ];
        let mut sim = Simulation::new(config).unwrap();

        sim.step();
        assert_eq!(sim.stats().spawned, 2);
        for _ in 0..10 {
            sim.step();
        }
        let cap = SpeciesProfile::brute().pool_capacity.unwrap_or(32);
        assert_eq!(sim.stats().spawned as usize, 2 + cap);
        assert_eq!(sim.report().spawn_failures as usize, 6 - cap);
    }
}
