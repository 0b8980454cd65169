//! Knockback impulses

use horde_math::Vec2;

/// Velocity impulse pushing `target` directly away from `source`.
///
/// When the two positions coincide the push follows `fallback_direction`
/// (normally the attacker's facing). A non-positive force yields zero.
pub fn knockback_impulse(source: Vec2, target: Vec2, force: f32, fallback_direction: Vec2) -> Vec2 {
    if force <= 0.0 {
        return Vec2::ZERO;
    }
    let direction = (target - source).normalize_or(fallback_direction.normalize_or_zero());
    direction * force
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_points_away_from_source() {
        let impulse = knockback_impulse(Vec2::ZERO, Vec2::new(3.0, 4.0), 10.0, Vec2::X);
        assert_relative_eq!(impulse.x, 6.0);
        assert_relative_eq!(impulse.y, 8.0);
    }

    #[test]
    fn test_overlapping_positions_use_fallback() {
        let impulse = knockback_impulse(Vec2::ONE, Vec2::ONE, 5.0, Vec2::new(0.0, -2.0));
        assert_relative_eq!(impulse.y, -5.0);
        assert_eq!(knockback_impulse(Vec2::ZERO, Vec2::X, 0.0, Vec2::X), Vec2::ZERO);
    }
}
