//! Axis-aligned bounding boxes

use crate::vector::Vec2;

/// Axis-aligned bounding box on the simulation plane
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    #[inline]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create from center and half-extents
    #[inline]
    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Move the box by `offset`
    #[inline]
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Boxes touching on an edge count as intersecting
    #[inline]
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
    }

    #[inline]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.max(self.min).min(self.max)
    }

    #[inline]
    pub fn distance_squared_to_point(&self, point: Vec2) -> f32 {
        self.closest_point(point).distance_squared(point)
    }

    /// Exact separation between the two boxes; zero when they overlap
    pub fn gap(&self, other: &Aabb2) -> f32 {
        let dx = (other.min.x - self.max.x).max(self.min.x - other.max.x).max(0.0);
        let dy = (other.min.y - self.max.y).max(self.min.y - other.max.y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(x: f32, y: f32) -> Aabb2 {
        Aabb2::from_center_half_extents(Vec2::new(x, y), Vec2::splat(0.5))
    }

    #[test]
    fn test_overlapping_boxes_have_zero_gap() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(0.5, 0.5);
        assert!(a.intersects(&b));
        assert_eq!(a.gap(&b), 0.0);
    }

    #[test]
    fn test_gap_is_edge_to_edge() {
        let a = unit_box_at(0.0, 0.0);
        let b = unit_box_at(3.0, 0.0);
        assert!(!a.intersects(&b));
        assert_relative_eq!(a.gap(&b), 2.0);

        let diagonal = unit_box_at(4.0, 5.0);
        assert_relative_eq!(a.gap(&diagonal), 5.0);
    }

    #[test]
    fn test_contains_and_closest_point() {
        let a = unit_box_at(0.0, 0.0);
        assert!(a.contains_point(Vec2::new(0.25, -0.25)));
        assert_eq!(a.closest_point(Vec2::new(2.0, 0.0)), Vec2::new(0.5, 0.0));
        assert_relative_eq!(a.distance_squared_to_point(Vec2::new(2.5, 0.0)), 4.0);
        assert_eq!(a.translate(Vec2::X).center(), Vec2::X);
    }
}
