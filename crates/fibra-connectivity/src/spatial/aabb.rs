// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Axis-aligned bounding boxes in 3D.
*/

use crate::types::{add, Point3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in 3D, closed on both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb3 {
    pub min: Point3,
    pub max: Point3,
}

impl Aabb3 {
    /// Create a box from min/max corners
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Degenerate box holding a single point
    pub const fn from_point(point: Point3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Cube with its minimum corner at `origin` and edge `size`
    pub fn cube(origin: Point3, size: f64) -> Self {
        Self {
            min: origin,
            max: add(origin, [size, size, size]),
        }
    }

    /// Grow this box to also cover `other`
    pub fn expand(&mut self, other: &Aabb3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(other.min[axis]);
            self.max[axis] = self.max[axis].max(other.max[axis]);
        }
    }

    /// Smallest box covering both
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        out.expand(other);
        out
    }

    /// Same box moved by `offset`
    pub fn translated(&self, offset: Point3) -> Aabb3 {
        Aabb3 {
            min: add(self.min, offset),
            max: add(self.max, offset),
        }
    }

    /// Whether the boxes share at least one point (touching counts).
    pub fn intersects(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    /// Whether the point lies inside or on the boundary
    pub fn contains_point(&self, point: Point3) -> bool {
        (0..3).all(|axis| self.min[axis] <= point[axis] && point[axis] <= self.max[axis])
    }

    /// Edge lengths along x, y, z
    pub fn extent(&self) -> Point3 {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Longest edge
    pub fn max_extent(&self) -> f64 {
        let e = self.extent();
        e[0].max(e[1]).max(e[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_boxes() {
        let a = Aabb3::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb3::new([10.0, 10.0, 10.0], [11.0, 11.0, 11.0]);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = Aabb3::cube([0.0, 0.0, 0.0], 1.0);
        let b = Aabb3::cube([1.0, 0.0, 0.0], 1.0);
        assert!(a.intersects(&b));
    }

    #[test]
    fn test_disjoint_on_one_axis_only() {
        let a = Aabb3::cube([0.0, 0.0, 0.0], 5.0);
        let b = Aabb3::new([1.0, 1.0, 6.0], [2.0, 2.0, 7.0]);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_expand_from_point() {
        let mut bbox = Aabb3::from_point([5.0, 5.0, 5.0]);
        bbox.expand(&Aabb3::cube([-1.0, 6.0, 2.0], 2.0));
        assert_eq!(bbox.min, [-1.0, 5.0, 2.0]);
        assert_eq!(bbox.max, [5.0, 8.0, 5.0]);
        assert!(bbox.contains_point([0.0, 7.0, 4.0]));
        assert_eq!(bbox.max_extent(), 6.0);
    }

    #[test]
    fn test_translated() {
        let bbox = Aabb3::cube([0.0, 0.0, 0.0], 2.0).translated([10.0, -1.0, 0.5]);
        assert_eq!(bbox.min, [10.0, -1.0, 0.5]);
        assert_eq!(bbox.max, [12.0, 1.0, 2.5]);
    }
}
