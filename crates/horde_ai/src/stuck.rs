//! Patrol stuck detection and route recovery
//!
//! While patrolling, the agent's position is sampled every
//! `sample_interval_ms`. Intervals in which it moved less than
//! `min_movement` accumulate; once the total reaches `stuck_time_ms` the
//! route is mutated so the agent heads somewhere else.

use crate::config::StuckConfig;
use crate::route::PatrolRoute;
use horde_math::{consts::TAU, Vec2};
use rand::Rng;

/// How a stuck route was repaired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Skipped the unreachable waypoint
    DroppedWaypoint,
    /// Replaced the only waypoint with one behind the agent
    Reflected,
    /// Built a fresh default route
    Regenerated,
}

/// Result of one [`StuckDetector::sample`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuckOutcome {
    /// Interval not elapsed yet (or first sample recorded)
    Waiting,
    Moving,
    Accumulating { accumulated_ms: u64 },
    Recovered(Recovery),
}

#[derive(Debug, Clone, Default)]
pub struct StuckDetector {
    last_position: Option<Vec2>,
    last_sample_ms: u64,
    accumulated_ms: u64,
    recoveries: u32,
}

impl StuckDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    /// Recoveries since the last spawn
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    pub fn is_sampling(&self) -> bool {
        self.last_position.is_some()
    }

    /// Forget the sample history (leaving patrol, waiting at a waypoint)
    pub fn reset(&mut self) {
        self.last_position = None;
        self.last_sample_ms = 0;
        self.accumulated_ms = 0;
    }

    /// Full reset for a recycled agent
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        now_ms: u64,
        position: Vec2,
        facing: Vec2,
        route: &mut PatrolRoute,
        config: &StuckConfig,
        rng: &mut R,
    ) -> StuckOutcome {
        let Some(last_position) = self.last_position else {
            self.last_position = Some(position);
            self.last_sample_ms = now_ms;
            return StuckOutcome::Waiting;
        };

        let elapsed = now_ms.saturating_sub(self.last_sample_ms);
        if elapsed < config.sample_interval_ms {
            return StuckOutcome::Waiting;
        }

        self.last_position = Some(position);
        self.last_sample_ms = now_ms;

        let min_sq = config.min_movement * config.min_movement;
        if last_position.distance_squared(position) >= min_sq {
            self.accumulated_ms = 0;
            return StuckOutcome::Moving;
        }

        self.accumulated_ms += elapsed;
        if self.accumulated_ms < config.stuck_time_ms {
            return StuckOutcome::Accumulating {
                accumulated_ms: self.accumulated_ms,
            };
        }

        let recovery = recover_route(position, facing, route, config, rng);
        self.accumulated_ms = 0;
        self.recoveries += 1;
        log::debug!(
            "Stuck at ({:.1}, {:.1}), recovered route by {:?}",
            position.x,
            position.y,
            recovery
        );
        StuckOutcome::Recovered(recovery)
    }
}

/// Mutate `route` so the agent stops pushing toward an unreachable point.
/// The route is never empty afterwards.
pub fn recover_route<R: Rng + ?Sized>(
    position: Vec2,
    facing: Vec2,
    route: &mut PatrolRoute,
    config: &StuckConfig,
    rng: &mut R,
) -> Recovery {
    match route.len() {
        0 => {
            regenerate_default(route, position, config, rng);
            Recovery::Regenerated
        }
        1 => {
            let lo = config.recovery_min_distance.min(config.recovery_max_distance);
            let hi = config.recovery_min_distance.max(config.recovery_max_distance);
            let distance = rng.gen_range(lo..=hi);
            let away = if facing.is_zero() {
                Vec2::from_angle(rng.gen_range(0.0..TAU))
            } else {
                -facing.normalize_or_zero()
            };
            route.replace_current(position + away * distance);
            Recovery::Reflected
        }
        _ => {
            route.remove_current();
            Recovery::DroppedWaypoint
        }
    }
}

/// Circle of `route_points` waypoints around `center` with a random phase
pub fn regenerate_default<R: Rng + ?Sized>(
    route: &mut PatrolRoute,
    center: Vec2,
    config: &StuckConfig,
    rng: &mut R,
) {
    let phase = rng.gen_range(0.0..TAU);
    route.regenerate_around(center, config.route_radius, config.route_points, phase);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{rngs::SmallRng, SeedableRng};

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    #[test]
    fn test_three_still_intervals_trigger_recovery() {
        let config = StuckConfig::default();
        let mut detector = StuckDetector::new();
        let mut route = PatrolRoute::new(vec![Vec2::new(100.0, 0.0), Vec2::new(0.0, 100.0)]);
        let mut rng = rng();
        let pos = Vec2::ZERO;

        assert_eq!(detector.sample(0, pos, Vec2::X, &mut route, &config, &mut rng), StuckOutcome::Waiting);
        assert_eq!(detector.sample(200, pos, Vec2::X, &mut route, &config, &mut rng), StuckOutcome::Waiting);
        assert_eq!(
            detector.sample(500, pos, Vec2::X, &mut route, &config, &mut rng),
            StuckOutcome::Accumulating { accumulated_ms: 500 }
        );
        assert_eq!(
            detector.sample(1_000, pos, Vec2::X, &mut route, &config, &mut rng),
            StuckOutcome::Accumulating { accumulated_ms: 1_000 }
        );
        assert_eq!(
            detector.sample(1_500, pos, Vec2::X, &mut route, &config, &mut rng),
            StuckOutcome::Recovered(Recovery::DroppedWaypoint)
        );
        assert_eq!(detector.accumulated_ms(), 0);
        assert_eq!(route.len(), 1);
        assert_eq!(route.current(), Some(Vec2::new(0.0, 100.0)));
    }

    #[test]
    fn test_movement_resets_accumulator() {
        let config = StuckConfig::default();
        let mut detector = StuckDetector::new();
        let mut route = PatrolRoute::new(vec![Vec2::new(100.0, 0.0)]);
        let mut rng = rng();

        detector.sample(0, Vec2::ZERO, Vec2::X, &mut route, &config, &mut rng);
        detector.sample(500, Vec2::ZERO, Vec2::X, &mut route, &config, &mut rng);
        assert_eq!(detector.accumulated_ms(), 500);
        assert_eq!(
            detector.sample(1_000, Vec2::new(30.0, 0.0), Vec2::X, &mut route, &config, &mut rng),
            StuckOutcome::Moving
        );
        assert_eq!(detector.accumulated_ms(), 0);
    }

    #[test]
    fn test_single_waypoint_is_reflected_behind() {
        let config = StuckConfig::default();
        let mut route = PatrolRoute::new(vec![Vec2::new(50.0, 0.0)]);
        let recovery = recover_route(Vec2::ZERO, Vec2::X, &mut route, &config, &mut rng());
        assert_eq!(recovery, Recovery::Reflected);

        let waypoint = route.current().unwrap();
        assert!(waypoint.x <= -config.recovery_min_distance + 1e-3);
        assert!(waypoint.x >= -config.recovery_max_distance - 1e-3);
        assert_relative_eq!(waypoint.y, 0.0);
    }

    #[test]
    fn test_empty_route_is_regenerated() {
        let config = StuckConfig::default();
        let mut route = PatrolRoute::default();
        let center = Vec2::new(10.0, -10.0);
        let recovery = recover_route(center, Vec2::ZERO, &mut route, &config, &mut rng());
        assert_eq!(recovery, Recovery::Regenerated);
        assert_eq!(route.len(), config.route_points);
        for waypoint in route.waypoints() {
            assert_relative_eq!(waypoint.distance(center), config.route_radius, epsilon = 1e-3);
        }
    }
}
