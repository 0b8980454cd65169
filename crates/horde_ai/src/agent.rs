//! Per-instance agent record
//!
//! An [`Agent`] owns everything one hostile needs between ticks: transform,
//! combat stats, state machine, patrol route, ability gate, stuck tracker and
//! its private timer queue. It owns no collaborators; the physics world,
//! target, event sink and RNG arrive through [`TickContext`] on each update.
//!
//! All state changes go through [`Agent::request_transition`], which asks the
//! species' [`TransitionTable`](crate::state_machine::TransitionTable) and
//! runs exit/enter effects for whatever it allows.

use crate::behavior;
use crate::config::AiConfig;
use crate::cooldown::{AbilityGate, AbilityId};
use crate::events::{AgentEvent, EventSink};
use crate::route::PatrolRoute;
use crate::species::{SpeciesId, SpeciesProfile};
use crate::state_machine::{AgentState, StateMachine, TransitionCause, TransitionDecision};
use crate::stuck::StuckDetector;
use crate::timer::{Deferred, TimerQueue};
use crate::world::{PhysicsWorld, Target};
use horde_combat::{mitigate_flat, CombatStats, Health};
use horde_math::{Aabb2, Vec2};
use rand::rngs::SmallRng;
use std::sync::Arc;

/// Stable instance id, fresh for every spawn
pub type AgentId = horde_core::Id;

/// Collaborators for one agent update
pub struct TickContext<'a> {
    pub world: &'a mut dyn PhysicsWorld,
    pub target: &'a mut dyn Target,
    pub events: &'a mut dyn EventSink,
    pub rng: &'a mut SmallRng,
    pub config: &'a AiConfig,
}

/// Transient flags cleared on every spawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentFlags {
    /// Dash phase of a charge (after the telegraph)
    pub is_charging: bool,
    /// The current charge already hit
    pub charge_connected: bool,
    /// Ability waiting for its windup timer
    pub pending_windup: Option<AbilityId>,
    /// Holding in an intermediate state
    pub awaiting_resume: bool,
    pub enraged: bool,
    /// Death exit elapsed; the spawner releases the agent
    pub exit_complete: bool,
}

/// Per-spawn values
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpawnParams {
    pub id: AgentId,
    pub position: Vec2,
    pub now_ms: u64,
    pub route_phase: f32,
}

pub struct Agent {
    id: AgentId,
    species: SpeciesId,
    pub(crate) profile: Arc<SpeciesProfile>,
    pool: u16,

    pub(crate) position: Vec2,
    pub(crate) facing: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) charge_direction: Vec2,

    pub(crate) stats: CombatStats,
    health: Health,

    pub(crate) machine: StateMachine,
    pub(crate) route: PatrolRoute,
    pub(crate) last_wait_ms: Option<u64>,

    pub(crate) abilities: AbilityGate,
    pub(crate) flags: AgentFlags,
    pub(crate) stuck: StuckDetector,
    pub(crate) timers: TimerQueue,
    pub(crate) clock_ms: u64,
    active: bool,
}

impl Agent {
    pub(crate) fn spawn(
        species: SpeciesId,
        profile: Arc<SpeciesProfile>,
        pool: u16,
        params: &SpawnParams,
        config: &AiConfig,
    ) -> Self {
        let mut abilities = AbilityGate::new();
        for spec in &profile.abilities {
            abilities.register(spec.id, spec.cooldown_ms);
        }

        let mut agent = Self {
            id: params.id,
            species,
            stats: profile.stats,
            health: Health::new(profile.stats.max_health),
            profile,
            pool,
            position: params.position,
            facing: Vec2::X,
            velocity: Vec2::ZERO,
            charge_direction: Vec2::ZERO,
            machine: StateMachine::new(AgentState::Idle, params.now_ms),
            route: PatrolRoute::default(),
            last_wait_ms: None,
            abilities,
            flags: AgentFlags::default(),
            stuck: StuckDetector::new(),
            timers: TimerQueue::new(),
            clock_ms: params.now_ms,
            active: false,
        };
        agent.respawn(params, config);
        agent
    }

    /// Reset a recycled slot to spawn defaults, reusing its allocations
    pub(crate) fn respawn(&mut self, params: &SpawnParams, config: &AiConfig) {
        self.id = params.id;
        self.position = params.position;
        self.facing = Vec2::X;
        self.velocity = Vec2::ZERO;
        self.charge_direction = Vec2::ZERO;

        self.stats = self.profile.stats;
        self.health.reset(self.stats.max_health);

        self.machine.reset(AgentState::Idle, params.now_ms);
        self.route.clear();
        if let Some(radius) = self.profile.patrol_radius {
            self.route.regenerate_around(
                params.position,
                radius,
                config.stuck.route_points,
                params.route_phase,
            );
        }
        self.last_wait_ms = None;

        self.abilities.reset();
        self.flags = AgentFlags::default();
        self.stuck.clear();
        self.timers.invalidate();
        self.clock_ms = params.now_ms;
        self.active = true;
    }

    /// Take the agent out of the simulation. Pending timers die with it.
    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.velocity = Vec2::ZERO;
        self.timers.invalidate();
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn species(&self) -> &SpeciesId {
        &self.species
    }

    pub fn profile(&self) -> &SpeciesProfile {
        &self.profile
    }

    pub fn pool_index(&self) -> u16 {
        self.pool
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> AgentState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> Option<AgentState> {
        self.machine.previous()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Bounds from the last synced position
    pub fn bounds(&self) -> Aabb2 {
        Aabb2::from_center_half_extents(self.position, self.profile.half_extents)
    }

    pub fn health(&self) -> f32 {
        self.health.current()
    }

    pub fn max_health(&self) -> f32 {
        self.health.max()
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn route(&self) -> &PatrolRoute {
        &self.route
    }

    pub fn abilities(&self) -> &AbilityGate {
        &self.abilities
    }

    pub fn flags(&self) -> &AgentFlags {
        &self.flags
    }

    pub fn stuck(&self) -> &StuckDetector {
        &self.stuck
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn exit_complete(&self) -> bool {
        self.flags.exit_complete
    }

    /// Replace the patrol route. An empty list clears it.
    pub fn set_patrol_route<I>(&mut self, waypoints: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.route.set(waypoints);
        self.stuck.reset();
        self.last_wait_ms = None;
    }

    /// Apply incoming damage after flat defense.
    ///
    /// Death is resolved before this returns. Damage to an inactive or dead
    /// agent does nothing and returns 0.
    pub fn take_damage(&mut self, amount: f32, events: &mut dyn EventSink) -> f32 {
        if !self.active || self.health.is_dead() {
            return 0.0;
        }

        let outcome = self.health.apply_damage(mitigate_flat(amount, self.stats.defense));
        if outcome.died {
            self.request_transition(AgentState::Die, TransitionCause::Death, events);
            return outcome.applied;
        }
        if outcome.applied > 0.0 {
            self.check_enrage(events);
            if self.profile.hurt_ms > 0 {
                self.request_transition(AgentState::Hurt, TransitionCause::Damage, events);
            }
        }
        outcome.applied
    }

    /// Stun for `duration_ms`. Returns false when the current state refuses.
    pub fn apply_stun(&mut self, duration_ms: u64, events: &mut dyn EventSink) -> bool {
        if !self.active {
            return false;
        }
        let decision = self.request_transition(AgentState::Stunned, TransitionCause::Stun, events);
        if decision != TransitionDecision::Direct {
            return false;
        }
        self.timers.schedule(
            self.clock_ms,
            duration_ms,
            Deferred::StateExpiry(AgentState::Stunned),
        );
        true
    }

    /// Run one tick of the pipeline
    pub fn update(&mut self, now_ms: u64, ctx: &mut TickContext<'_>) {
        if !self.active {
            return;
        }
        self.clock_ms = now_ms;
        if let Some(position) = ctx.world.position(self.id) {
            self.position = position;
        }

        self.fire_due_timers(ctx);

        if self.flags.exit_complete {
            self.velocity = Vec2::ZERO;
        } else {
            behavior::run(self, ctx);
        }
        ctx.world.set_velocity(self.id, self.velocity);
    }

    fn fire_due_timers(&mut self, ctx: &mut TickContext<'_>) {
        while let Some((token, action)) = self.timers.pop_due(self.clock_ms) {
            if !self.timers.is_current(token) {
                log::debug!("Agent {} dropped stale timer {:?}", self.id, action);
                continue;
            }
            self.on_timer(action, ctx);
            if self.flags.exit_complete {
                break;
            }
        }
    }

    fn on_timer(&mut self, action: Deferred, ctx: &mut TickContext<'_>) {
        match action {
            Deferred::AbilityReady(id) => self.abilities.mark_ready(id),
            Deferred::Windup(id) => {
                if self.flags.pending_windup == Some(id) {
                    self.flags.pending_windup = None;
                    behavior::finish_windup(self, id, ctx);
                }
            }
            Deferred::StateExpiry(state) => {
                if self.machine.is_in(state) {
                    self.request_transition(AgentState::Idle, TransitionCause::Expiry, ctx.events);
                }
            }
            Deferred::TransitionResume => self.flags.awaiting_resume = false,
            Deferred::DeathExit => {
                log::debug!("Agent {} ({}) finished dying", self.id, self.species);
                self.flags.exit_complete = true;
            }
        }
    }

    /// Ask the transition table for `to` and carry out its verdict
    pub fn request_transition(
        &mut self,
        to: AgentState,
        cause: TransitionCause,
        events: &mut dyn EventSink,
    ) -> TransitionDecision {
        let from = self.machine.current();
        let decision = self.profile.transitions.validate(from, to, cause);
        match decision {
            TransitionDecision::NoOp => {}
            TransitionDecision::Rejected => {
                log::trace!("Agent {} refused {} -> {} ({:?})", self.id, from, to, cause);
            }
            TransitionDecision::Direct => self.change_state(to, events),
            TransitionDecision::Via {
                intermediate,
                delay_ms,
            } => {
                self.change_state(intermediate, events);
                self.flags.awaiting_resume = true;
                self.timers
                    .schedule(self.clock_ms, delay_ms, Deferred::TransitionResume);
            }
        }
        decision
    }

    fn change_state(&mut self, to: AgentState, events: &mut dyn EventSink) {
        let from = self.machine.current();
        self.exit_state(from, events);
        self.machine.force_transition(to, self.clock_ms);
        events.emit(AgentEvent::StateChanged {
            agent: self.id,
            from,
            to,
        });
        self.enter_state(to, events);
    }

    fn exit_state(&mut self, from: AgentState, events: &mut dyn EventSink) {
        match from {
            AgentState::Patrol => {
                self.stuck.reset();
                self.last_wait_ms = None;
            }
            AgentState::Charge => self.end_charge(events),
            _ => self.interrupt_windup(events),
        }
        if self.flags.awaiting_resume {
            self.flags.awaiting_resume = false;
            self.timers.cancel_where(|a| *a == Deferred::TransitionResume);
        }
    }

    fn enter_state(&mut self, to: AgentState, events: &mut dyn EventSink) {
        match to {
            AgentState::Hurt => {
                self.velocity = Vec2::ZERO;
                self.timers.schedule(
                    self.clock_ms,
                    self.profile.hurt_ms,
                    Deferred::StateExpiry(AgentState::Hurt),
                );
            }
            AgentState::Stunned => self.velocity = Vec2::ZERO,
            AgentState::Die => {
                self.velocity = Vec2::ZERO;
                self.timers.cancel_where(|_| true);
                events.emit(AgentEvent::Death {
                    agent: self.id,
                    position: self.position,
                    experience: self.stats.experience,
                });
                self.timers.schedule(
                    self.clock_ms,
                    self.profile.death_exit_ms,
                    Deferred::DeathExit,
                );
                log::debug!("Agent {} ({}) died", self.id, self.species);
            }
            _ => {}
        }
    }

    /// Cancel an ability still in its windup
    fn interrupt_windup(&mut self, events: &mut dyn EventSink) {
        let Some(id) = self.flags.pending_windup.take() else {
            return;
        };
        self.timers.cancel_where(|a| *a == Deferred::Windup(id));
        self.abilities.set_in_progress(id, false);
        events.emit(AgentEvent::AbilityStopped {
            agent: self.id,
            ability: id,
        });
        log::debug!("Agent {} {} interrupted during windup", self.id, id);
    }

    fn end_charge(&mut self, events: &mut dyn EventSink) {
        let was_running = self.abilities.is_in_progress(AbilityId::Charge)
            || self.flags.pending_windup == Some(AbilityId::Charge);

        if self.flags.pending_windup == Some(AbilityId::Charge) {
            self.flags.pending_windup = None;
        }
        self.timers.cancel_where(|a| {
            matches!(
                a,
                Deferred::Windup(AbilityId::Charge) | Deferred::StateExpiry(AgentState::Charge)
            )
        });
        self.flags.is_charging = false;
        self.flags.charge_connected = false;
        self.charge_direction = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        self.abilities.set_in_progress(AbilityId::Charge, false);

        if was_running {
            events.emit(AgentEvent::AbilityStopped {
                agent: self.id,
                ability: AbilityId::Charge,
            });
        }
    }

    fn check_enrage(&mut self, events: &mut dyn EventSink) {
        let Some(phase) = self.profile.enrage else {
            return;
        };
        if self.flags.enraged || self.health.fraction() > phase.health_fraction {
            return;
        }
        self.flags.enraged = true;
        self.stats.scale(phase.damage_multiplier, phase.speed_multiplier);
        events.emit(AgentEvent::Enraged { agent: self.id });
        log::info!("Agent {} ({}) enraged", self.id, self.species);
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("species", &self.species)
            .field("state", &self.machine.current())
            .field("position", &self.position)
            .field("health", &self.health.current())
            .field("active", &self.active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilitySpec;
    use crate::species::BehaviorKind;

    fn params(now_ms: u64) -> SpawnParams {
        SpawnParams {
            id: AgentId::from_raw(1),
            position: Vec2::ZERO,
            now_ms,
            route_phase: 0.0,
        }
    }

    fn agent(profile: SpeciesProfile) -> Agent {
        Agent::spawn(
            SpeciesId::new("test"),
            Arc::new(profile),
            0,
            &params(0),
            &AiConfig::default(),
        )
    }

    #[test]
    fn test_spawn_defaults() {
        let agent = agent(SpeciesProfile::grunt());
        assert!(agent.is_active());
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(agent.health(), agent.max_health());
        assert_eq!(agent.route().len(), AiConfig::default().stuck.route_points);
        assert!(agent.abilities().is_ready(AbilityId::Basic));
    }

    #[test]
    fn test_damage_enters_hurt_and_death_is_once() {
        let mut agent = agent(SpeciesProfile::grunt());
        let mut events = Vec::new();

        assert_eq!(agent.take_damage(30.0, &mut events), 30.0);
        assert_eq!(agent.state(), AgentState::Hurt);

        assert_eq!(agent.take_damage(500.0, &mut events), 70.0);
        assert_eq!(agent.state(), AgentState::Die);
        assert_eq!(agent.health(), 0.0);

        let deaths = |events: &[AgentEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, AgentEvent::Death { .. }))
                .count()
        };
        assert_eq!(deaths(&events), 1);

        let before = events.len();
        assert_eq!(agent.take_damage(10.0, &mut events), 0.0);
        assert_eq!(events.len(), before);
        assert_eq!(deaths(&events), 1);
    }

    #[test]
    fn test_defense_reduces_damage() {
        let mut profile = SpeciesProfile::grunt();
        profile.stats.defense = 4.0;
        let mut agent = agent(profile);
        assert_eq!(agent.take_damage(10.0, &mut Vec::new()), 6.0);
        assert_eq!(agent.take_damage(3.0, &mut Vec::new()), 0.0);
    }

    #[test]
    fn test_no_flinch_species_stays_put() {
        let mut agent = agent(SpeciesProfile::brute());
        agent.take_damage(20.0, &mut Vec::new());
        assert_eq!(agent.state(), AgentState::Idle);
    }

    #[test]
    fn test_enrage_triggers_once() {
        let mut agent = agent(SpeciesProfile::brute());
        let base_damage = agent.stats().damage;
        let mut events = Vec::new();

        agent.take_damage(200.0, &mut events);
        agent.take_damage(10.0, &mut events);

        let enraged = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::Enraged { .. }))
            .count();
        assert_eq!(enraged, 1);
        assert!(agent.flags().enraged);
        assert_eq!(agent.stats().damage, base_damage * 1.5);
    }

    #[test]
    fn test_stun_refused_while_hurt() {
        let mut agent = agent(SpeciesProfile::grunt());
        let mut events = Vec::new();
        agent.take_damage(5.0, &mut events);
        assert_eq!(agent.state(), AgentState::Hurt);
        assert!(!agent.apply_stun(1_000, &mut events));

        let mut fresh = self::agent(SpeciesProfile::grunt());
        assert!(fresh.apply_stun(1_000, &mut events));
        assert_eq!(fresh.state(), AgentState::Stunned);
    }

    #[test]
    fn test_illegal_request_holds_in_intermediate() {
        let mut profile = SpeciesProfile::grunt();
        profile.behavior = BehaviorKind::Melee;
        profile.abilities = vec![AbilitySpec::basic(500)];
        let mut agent = agent(profile);
        let mut events = Vec::new();

        agent.request_transition(AgentState::Attack, TransitionCause::Classifier, &mut events);
        let decision = agent.request_transition(AgentState::Patrol, TransitionCause::Classifier, &mut events);
        assert!(matches!(decision, TransitionDecision::Via { .. }));
        assert_eq!(agent.state(), AgentState::Idle);
        assert!(agent.flags().awaiting_resume);
        assert!(agent
            .timers()
            .is_pending(|a| *a == Deferred::TransitionResume));
    }

    #[test]
    fn test_self_transition_emits_nothing() {
        let mut agent = agent(SpeciesProfile::grunt());
        let mut events = Vec::new();
        let decision = agent.request_transition(AgentState::Idle, TransitionCause::Classifier, &mut events);
        assert_eq!(decision, TransitionDecision::NoOp);
        assert!(events.is_empty());
    }
}
