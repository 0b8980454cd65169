//! Behavior executor
//!
//! Runs after timers have fired. Reactive states (hurt, stunned, dead) only
//! hold still. A charge drives its own dash. Otherwise the species
//! specialization gets the first chance to act, then the classifier proposes
//! a state and the per-state action for whatever state results is executed.

use crate::ability::{self, AbilitySpec, Strike};
use crate::agent::{Agent, TickContext};
use crate::cooldown::AbilityId;
use crate::distance::TargetReading;
use crate::species::BehaviorKind;
use crate::state_machine::{classify, AgentState, ClassifierInput, TransitionCause, TransitionDecision};
use crate::stuck::StuckOutcome;
use crate::events::AgentEvent;
use crate::timer::Deferred;
use horde_math::{consts::TAU, Vec2};
use rand::Rng;
use std::sync::Arc;

pub(crate) fn run(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    match agent.machine.current() {
        AgentState::Die | AgentState::Hurt | AgentState::Stunned => {
            agent.velocity = Vec2::ZERO;
            return;
        }
        AgentState::Charge => {
            charge_tick(agent, ctx);
            return;
        }
        _ => {}
    }

    let reading = TargetReading::measure(agent.position, &*ctx.target);

    if agent.flags.pending_windup.is_some() {
        face(agent, reading.position);
        agent.velocity = Vec2::ZERO;
        return;
    }
    if agent.flags.awaiting_resume {
        agent.velocity = Vec2::ZERO;
        return;
    }

    let acted = match agent.profile.behavior {
        BehaviorKind::Charger => try_charge(agent, &reading, ctx),
        BehaviorKind::Brute => try_slam(agent, &reading, ctx),
        BehaviorKind::Melee | BehaviorKind::Sentry => false,
    };
    if acted {
        return;
    }

    let input = ClassifierInput {
        distance_sq: reading.distance_sq,
        attack_range: agent.profile.attack_range,
        detection_range: agent.profile.detection_range,
        basic_attack_ready: basic_attack_ready(agent),
        has_patrol_route: agent.profile.behavior.moves() && !agent.route.is_empty(),
    };
    let proposed = classify(&input);
    agent.request_transition(proposed, TransitionCause::Classifier, ctx.events);

    match agent.machine.current() {
        AgentState::Patrol => patrol_step(agent, ctx),
        AgentState::Chase => chase_step(agent, &reading),
        AgentState::Attack => attack_step(agent, &reading, ctx),
        _ => agent.velocity = Vec2::ZERO,
    }
}

/// Basic attack is off while any special ability runs
fn basic_attack_ready(agent: &Agent) -> bool {
    agent.abilities.is_ready(AbilityId::Basic) && !agent.abilities.is_using_skill()
}

fn face(agent: &mut Agent, point: Vec2) {
    agent.facing = (point - agent.position).normalize_or(agent.facing);
}

fn strike(agent: &Agent, ctx: &TickContext<'_>) -> Strike {
    Strike {
        position: agent.position,
        bounds: ctx.world.bounds(agent.id()).unwrap_or_else(|| agent.bounds()),
        facing: agent.facing,
        base_damage: agent.stats.damage,
    }
}

fn patrol_step(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    if agent.route.is_empty() {
        let radius = agent
            .profile
            .patrol_radius
            .unwrap_or(ctx.config.stuck.route_radius);
        let phase = ctx.rng.gen_range(0.0..TAU);
        agent
            .route
            .regenerate_around(agent.position, radius, ctx.config.stuck.route_points, phase);
        log::debug!("Agent {} regenerated an empty patrol route", agent.id());
    }

    let now = agent.clock_ms;
    if let Some(started) = agent.last_wait_ms {
        if now.saturating_sub(started) < ctx.config.patrol_wait_ms {
            agent.velocity = Vec2::ZERO;
            return;
        }
        agent.last_wait_ms = None;
    }

    let Some(waypoint) = agent.route.current() else {
        agent.velocity = Vec2::ZERO;
        return;
    };

    let arrival = ctx.config.waypoint_arrival_radius;
    if agent.position.distance_squared(waypoint) <= arrival * arrival {
        agent.route.advance();
        agent.last_wait_ms = Some(now);
        agent.velocity = Vec2::ZERO;
        agent.stuck.reset();
        return;
    }

    face(agent, waypoint);
    agent.velocity = agent.facing * agent.stats.speed;

    let outcome = agent.stuck.sample(
        now,
        agent.position,
        agent.facing,
        &mut agent.route,
        &ctx.config.stuck,
        &mut *ctx.rng,
    );
    if let StuckOutcome::Recovered(recovery) = outcome {
        log::debug!("Agent {} unstuck: {:?}", agent.id(), recovery);
    }
}

fn chase_step(agent: &mut Agent, reading: &TargetReading) {
    face(agent, reading.position);
    if !agent.profile.behavior.moves() || reading.within(agent.profile.attack_range) {
        agent.velocity = Vec2::ZERO;
        return;
    }
    agent.velocity = agent.facing * agent.stats.speed;
}

fn attack_step(agent: &mut Agent, reading: &TargetReading, ctx: &mut TickContext<'_>) {
    face(agent, reading.position);
    agent.velocity = Vec2::ZERO;
    if agent.flags.pending_windup.is_some() || !basic_attack_ready(agent) {
        return;
    }
    let profile = Arc::clone(&agent.profile);
    if let Some(spec) = profile.ability(AbilityId::Basic) {
        start_ability(agent, spec, ctx);
    }
}

fn try_charge(agent: &mut Agent, reading: &TargetReading, ctx: &mut TickContext<'_>) -> bool {
    if !agent.machine.is_in(AgentState::Chase) {
        return false;
    }
    let profile = Arc::clone(&agent.profile);
    let Some(spec) = profile.ability(AbilityId::Charge) else {
        return false;
    };
    if !agent.abilities.is_ready(AbilityId::Charge) || agent.abilities.is_using_skill() {
        return false;
    }
    if reading.within(profile.attack_range) || !reading.within(spec.effective_range(profile.attack_range)) {
        return false;
    }

    match agent.request_transition(AgentState::Charge, TransitionCause::Ability, ctx.events) {
        TransitionDecision::Direct => {}
        // Holding in the intermediate state owns the rest of this tick
        TransitionDecision::Via { .. } => {
            agent.velocity = Vec2::ZERO;
            return true;
        }
        _ => return false,
    }
    face(agent, reading.position);
    agent.velocity = Vec2::ZERO;
    start_ability(agent, spec, ctx)
}

fn try_slam(agent: &mut Agent, reading: &TargetReading, ctx: &mut TickContext<'_>) -> bool {
    let state = agent.machine.current();
    if !matches!(state, AgentState::Chase | AgentState::Attack) {
        return false;
    }
    let profile = Arc::clone(&agent.profile);
    let Some(spec) = profile.ability(AbilityId::Slam) else {
        return false;
    };
    if !agent.abilities.is_ready(AbilityId::Slam) || agent.abilities.is_using_skill() {
        return false;
    }
    if !reading.within(spec.effective_range(profile.attack_range)) {
        return false;
    }

    let decision = agent.request_transition(AgentState::Attack, TransitionCause::Ability, ctx.events);
    if matches!(decision, TransitionDecision::Via { .. }) {
        agent.velocity = Vec2::ZERO;
        return true;
    }
    if !agent.machine.is_in(AgentState::Attack) {
        return false;
    }
    face(agent, reading.position);
    agent.velocity = Vec2::ZERO;
    start_ability(agent, spec, ctx)
}

/// Consume the cooldown and either resolve now or schedule the windup
fn start_ability(agent: &mut Agent, spec: &AbilitySpec, ctx: &mut TickContext<'_>) -> bool {
    if !agent
        .abilities
        .try_activate(spec.id, agent.clock_ms, &mut agent.timers)
    {
        return false;
    }
    agent.abilities.set_in_progress(spec.id, true);
    ctx.events.emit(AgentEvent::AbilityStarted {
        agent: agent.id(),
        ability: spec.id,
    });
    log::debug!("Agent {} started {}", agent.id(), spec.id);

    if spec.windup_ms == 0 {
        finish_windup(agent, spec.id, ctx);
    } else {
        agent.flags.pending_windup = Some(spec.id);
        agent
            .timers
            .schedule(agent.clock_ms, spec.windup_ms, Deferred::Windup(spec.id));
    }
    true
}

/// Windup elapsed (or was zero)
pub(crate) fn finish_windup(agent: &mut Agent, id: AbilityId, ctx: &mut TickContext<'_>) {
    let profile = Arc::clone(&agent.profile);
    let Some(spec) = profile.ability(id) else {
        agent.abilities.set_in_progress(id, false);
        return;
    };

    if id == AbilityId::Charge {
        begin_dash(agent, spec, ctx);
        return;
    }

    face(agent, ctx.target.position());
    let strike = strike(agent, ctx);
    if let Some(report) = ability::resolve(spec, &strike, &mut *ctx.target) {
        log::debug!(
            "Agent {} {} hit for {:.1} ({:.1} taken)",
            agent.id(),
            id,
            report.amount,
            report.applied
        );
    }
    agent.abilities.set_in_progress(id, false);
    ctx.events.emit(AgentEvent::AbilityStopped {
        agent: agent.id(),
        ability: id,
    });
}

/// Lock the direction and start moving
fn begin_dash(agent: &mut Agent, spec: &AbilitySpec, ctx: &mut TickContext<'_>) {
    if !agent.machine.is_in(AgentState::Charge) {
        agent.abilities.set_in_progress(AbilityId::Charge, false);
        return;
    }
    let direction = (ctx.target.position() - agent.position).normalize_or(agent.facing);
    agent.charge_direction = direction;
    agent.facing = direction;
    agent.flags.is_charging = true;
    agent.flags.charge_connected = false;
    agent.velocity = direction * agent.stats.speed * spec.speed_scale;
    agent.timers.schedule(
        agent.clock_ms,
        spec.duration_ms,
        Deferred::StateExpiry(AgentState::Charge),
    );
}

/// Telegraph holds still; the dash moves and hits at most once
fn charge_tick(agent: &mut Agent, ctx: &mut TickContext<'_>) {
    if !agent.flags.is_charging {
        agent.velocity = Vec2::ZERO;
        return;
    }
    let profile = Arc::clone(&agent.profile);
    let Some(spec) = profile.ability(AbilityId::Charge) else {
        agent.velocity = Vec2::ZERO;
        return;
    };
    agent.velocity = agent.charge_direction * agent.stats.speed * spec.speed_scale;
    if agent.flags.charge_connected {
        return;
    }

    let strike = strike(agent, ctx);
    if let Some(report) = ability::resolve(spec, &strike, &mut *ctx.target) {
        agent.flags.charge_connected = true;
        log::debug!("Agent {} charge connected for {:.1}", agent.id(), report.amount);
    }
}
