//! Bounding shapes for collision overlap tests.
//!
//! Shapes are stored in local space (size only). The caller passes each
//! shape's current world position into [`BoundingShape::overlaps`], so a test
//! always runs against up-to-date positions and a shape never needs a handle
//! back to the entity it bounds.
//!
//! Every pair of variants is implemented and the test is symmetric:
//! `a.overlaps(pa, &b, pb) == b.overlaps(pb, &a, pa)`. Touching boundaries do
//! not count as overlap.
//!
//! # Example
//!
//! ```
//! use drift::shape::BoundingShape;
//! use glam::Vec2;
//!
//! let asteroid = BoundingShape::sphere(10.0);
//! let bullet = BoundingShape::sphere(1.0);
//!
//! assert!(asteroid.overlaps(Vec2::ZERO, &bullet, Vec2::new(5.0, 0.0)));
//! assert!(!asteroid.overlaps(Vec2::ZERO, &bullet, Vec2::new(11.0, 0.0)));
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Geometric proxy used for overlap tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundingShape {
    /// Circle of the given radius centred on the owner.
    Sphere {
        /// Radius in world units.
        radius: f32,
    },
    /// Axis-aligned box centred on the owner.
    Box {
        /// Half width and half height.
        half_extents: Vec2,
    },
}

impl BoundingShape {
    /// Creates a bounding sphere.
    ///
    /// # Panics
    ///
    /// Panics if `radius` is negative or not finite.
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        assert!(
            radius.is_finite() && radius >= 0.0,
            "sphere radius must be finite and non-negative, got {radius}"
        );
        Self::Sphere { radius }
    }

    /// Creates an axis-aligned bounding box.
    ///
    /// # Panics
    ///
    /// Panics if either half extent is negative or not finite.
    #[must_use]
    pub fn aabb(half_extents: Vec2) -> Self {
        assert!(
            half_extents.is_finite() && half_extents.x >= 0.0 && half_extents.y >= 0.0,
            "box half extents must be finite and non-negative, got {half_extents}"
        );
        Self::Box { half_extents }
    }

    /// Radius of the smallest circle enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Box { half_extents } => half_extents.length(),
        }
    }

    /// Tests whether this shape placed at `at` overlaps `other` placed at
    /// `other_at`.
    #[must_use]
    pub fn overlaps(&self, at: Vec2, other: &Self, other_at: Vec2) -> bool {
        match (*self, *other) {
            (Self::Sphere { radius: a }, Self::Sphere { radius: b }) => {
                let reach = a + b;
                at.distance_squared(other_at) < reach * reach
            }
            (Self::Sphere { radius }, Self::Box { half_extents }) => {
                sphere_box(at, radius, other_at, half_extents)
            }
            (Self::Box { half_extents }, Self::Sphere { radius }) => {
                sphere_box(other_at, radius, at, half_extents)
            }
            (Self::Box { half_extents: a }, Self::Box { half_extents: b }) => {
                let gap = (at - other_at).abs();
                let reach = a + b;
                gap.x < reach.x && gap.y < reach.y
            }
        }
    }
}

fn sphere_box(center: Vec2, radius: f32, box_center: Vec2, half_extents: Vec2) -> bool {
    let closest = center.clamp(box_center - half_extents, box_center + half_extents);
    center.distance_squared(closest) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod sphere_tests {
        use super::*;

        #[test]
        fn asteroid_and_bullet_overlap() {
            let asteroid = BoundingShape::sphere(10.0);
            let bullet = BoundingShape::sphere(1.0);
            assert!(asteroid.overlaps(Vec2::ZERO, &bullet, Vec2::new(5.0, 0.0)));
        }

        #[test]
        fn exact_touch_is_not_overlap() {
            let a = BoundingShape::sphere(2.0);
            let b = BoundingShape::sphere(3.0);
            assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(5.0, 0.0)));
            assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(3.0, 4.0)));
        }

        #[test]
        fn just_inside_touch_overlaps() {
            let a = BoundingShape::sphere(2.0);
            let b = BoundingShape::sphere(3.0);
            assert!(a.overlaps(Vec2::ZERO, &b, Vec2::new(4.999, 0.0)));
        }

        #[test]
        fn zero_radius_spheres_never_overlap() {
            let a = BoundingShape::sphere(0.0);
            assert!(!a.overlaps(Vec2::ZERO, &a, Vec2::ZERO));
        }

        #[test]
        #[should_panic(expected = "sphere radius must be finite")]
        fn negative_radius_panics() {
            let _ = BoundingShape::sphere(-1.0);
        }
    }

    mod box_tests {
        use super::*;

        #[test]
        fn boxes_overlap_on_both_axes() {
            let a = BoundingShape::aabb(Vec2::new(2.0, 2.0));
            let b = BoundingShape::aabb(Vec2::new(1.0, 1.0));
            assert!(a.overlaps(Vec2::ZERO, &b, Vec2::new(2.5, -2.5)));
            assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(3.0, 0.0)));
            assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(0.0, 3.5)));
        }

        #[test]
        fn sphere_near_box_corner() {
            let sphere = BoundingShape::sphere(1.0);
            let boxed = BoundingShape::aabb(Vec2::new(1.0, 1.0));

            // corner at (1, 1); sphere centre ~1.41 away
            assert!(!sphere.overlaps(Vec2::new(2.0, 2.0), &boxed, Vec2::ZERO));
            // same gap along an edge is inside
            assert!(sphere.overlaps(Vec2::new(1.9, 0.0), &boxed, Vec2::ZERO));
        }

        #[test]
        fn sphere_inside_box() {
            let sphere = BoundingShape::sphere(0.1);
            let boxed = BoundingShape::aabb(Vec2::new(5.0, 5.0));
            assert!(sphere.overlaps(Vec2::new(1.0, 1.0), &boxed, Vec2::ZERO));
        }

        #[test]
        fn bounding_radius_of_box_is_half_diagonal() {
            let boxed = BoundingShape::aabb(Vec2::new(3.0, 4.0));
            assert!((boxed.bounding_radius() - 5.0).abs() < 1e-6);
        }
    }

    #[test]
    fn serialization_roundtrip() {
        let shape = BoundingShape::aabb(Vec2::new(1.5, 2.5));
        let json = serde_json::to_string(&shape).unwrap();
        let back: BoundingShape = serde_json::from_str(&json).unwrap();
        assert_eq!(shape, back);
    }

    fn any_shape() -> impl Strategy<Value = BoundingShape> {
        prop_oneof![
            (0.0f32..50.0).prop_map(BoundingShape::sphere),
            (0.0f32..50.0, 0.0f32..50.0)
                .prop_map(|(x, y)| BoundingShape::aabb(Vec2::new(x, y))),
        ]
    }

    fn any_position() -> impl Strategy<Value = Vec2> {
        (-100.0f32..100.0, -100.0f32..100.0).prop_map(|(x, y)| Vec2::new(x, y))
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            a in any_shape(),
            b in any_shape(),
            pa in any_position(),
            pb in any_position(),
        ) {
            prop_assert_eq!(a.overlaps(pa, &b, pb), b.overlaps(pb, &a, pa));
        }

        #[test]
        fn spheres_overlap_iff_closer_than_radius_sum(
            r1 in 0.1f32..20.0,
            r2 in 0.1f32..20.0,
            pb in any_position(),
        ) {
            let a = BoundingShape::sphere(r1);
            let b = BoundingShape::sphere(r2);
            let reach = r1 + r2;
            let expected = pb.length_squared() < reach * reach;
            prop_assert_eq!(a.overlaps(Vec2::ZERO, &b, pb), expected);
        }
    }
}
