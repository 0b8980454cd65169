//! Patrol waypoint lists

use horde_math::{consts::TAU, Vec2};

/// An ordered, looping list of waypoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatrolRoute {
    waypoints: Vec<Vec2>,
    index: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        Self { waypoints, index: 0 }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn current(&self) -> Option<Vec2> {
        self.waypoints.get(self.index).copied()
    }

    /// Step to the next waypoint, wrapping around
    pub fn advance(&mut self) {
        if self.waypoints.is_empty() {
            self.index = 0;
            return;
        }
        self.index = (self.index + 1) % self.waypoints.len();
    }

    /// Drop the current waypoint. The next one takes its index.
    pub fn remove_current(&mut self) -> Option<Vec2> {
        if self.index >= self.waypoints.len() {
            return None;
        }
        let removed = self.waypoints.remove(self.index);
        if self.index >= self.waypoints.len() {
            self.index = 0;
        }
        Some(removed)
    }

    pub fn replace_current(&mut self, waypoint: Vec2) {
        match self.waypoints.get_mut(self.index) {
            Some(slot) => *slot = waypoint,
            None => {
                self.waypoints.push(waypoint);
                self.index = self.waypoints.len() - 1;
            }
        }
    }

    /// Replace every waypoint, keeping the allocation
    pub fn set<I>(&mut self, waypoints: I)
    where
        I: IntoIterator<Item = Vec2>,
    {
        self.waypoints.clear();
        self.waypoints.extend(waypoints);
        self.index = 0;
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.index = 0;
    }

    /// `points` waypoints evenly spaced on a circle, starting at `phase` radians
    pub fn regenerate_around(&mut self, center: Vec2, radius: f32, points: usize, phase: f32) {
        let points = points.max(1);
        let step = TAU / points as f32;
        self.set((0..points).map(|i| center + Vec2::from_angle(phase + step * i as f32) * radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> PatrolRoute {
        PatrolRoute::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
        ])
    }

    #[test]
    fn test_advance_wraps() {
        let mut route = square();
        route.advance();
        route.advance();
        assert_eq!(route.current(), Some(Vec2::new(10.0, 10.0)));
        route.advance();
        assert_eq!(route.index(), 0);
    }

    #[test]
    fn test_remove_current_at_end_wraps() {
        let mut route = square();
        route.advance();
        route.advance();
        assert_eq!(route.remove_current(), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(route.index(), 0);
        assert_eq!(route.len(), 2);

        let mut empty = PatrolRoute::default();
        assert_eq!(empty.remove_current(), None);
        assert_eq!(empty.current(), None);
    }

    #[test]
    fn test_regenerate_around() {
        let mut route = square();
        route.advance();
        route.regenerate_around(Vec2::new(5.0, 5.0), 10.0, 4, 0.0);
        assert_eq!(route.len(), 4);
        assert_eq!(route.index(), 0);
        for waypoint in route.waypoints() {
            assert_relative_eq!(waypoint.distance(Vec2::new(5.0, 5.0)), 10.0, epsilon = 1e-4);
        }
        let first = route.current().unwrap();
        assert_relative_eq!(first.x, 15.0, epsilon = 1e-4);
    }
}
