//! Kinematic state and the wrap-around arena bounds.
//!
//! Motion is plain explicit Euler integration. Tick durations are whole
//! milliseconds; rates are expressed per second.
//!
//! # Example
//!
//! ```
//! use drift::kinematics::{Kinematics, WorldBounds};
//! use glam::Vec2;
//!
//! let bounds = WorldBounds::new(200.0, 200.0);
//! let mut k = Kinematics::at_position(Vec2::new(95.0, 0.0));
//! k.velocity = Vec2::new(10.0, 0.0);
//!
//! // One second later the entity has left the right edge and re-entered on the left.
//! k.integrate(1000, &bounds);
//! assert!((k.position.x - (-95.0)).abs() < 1e-4);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Milliseconds per second, used to convert tick durations.
pub const MILLIS_PER_SECOND: f32 = 1000.0;

/// Converts a tick duration in milliseconds to seconds.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn millis_to_seconds(dt_ms: u32) -> f32 {
    dt_ms as f32 / MILLIS_PER_SECOND
}

// =============================================================================
// World Bounds
// =============================================================================

/// Toroidal arena bounds centred on the origin.
///
/// Positions live in `[-half_extents, half_extents)` on each axis. Anything
/// leaving one edge re-enters through the opposite edge, so every entity stays
/// reachable for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    half_extents: Vec2,
}

impl WorldBounds {
    /// Creates bounds of the given full width and height.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not a positive finite number.
    #[must_use]
    pub fn new(width: f32, height: f32) -> Self {
        assert!(
            width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0,
            "world bounds must be positive and finite, got {width} x {height}"
        );
        Self {
            half_extents: Vec2::new(width, height) * 0.5,
        }
    }

    /// Half the width and height of the arena.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// Full width of the arena.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    /// Full height of the arena.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    /// Returns true if `position` already lies inside the arena.
    #[must_use]
    pub fn contains(&self, position: Vec2) -> bool {
        let h = self.half_extents;
        (-h.x..h.x).contains(&position.x) && (-h.y..h.y).contains(&position.y)
    }

    /// Wraps a position back into the arena.
    #[must_use]
    pub fn wrap(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            wrap_axis(position.x, self.half_extents.x),
            wrap_axis(position.y, self.half_extents.y),
        )
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(200.0, 200.0)
    }
}

fn wrap_axis(value: f32, half: f32) -> f32 {
    if (-half..half).contains(&value) {
        return value;
    }
    let span = half * 2.0;
    let wrapped = (value + half).rem_euclid(span) - half;
    // rem_euclid may round up to exactly `span`
    if wrapped >= half {
        wrapped - span
    } else {
        wrapped
    }
}

// =============================================================================
// Kinematics
// =============================================================================

/// Position, velocity, acceleration, heading and rotation rate of an entity.
///
/// Heading is in degrees, counter-clockwise from +x. Rotation is in degrees
/// per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    /// World position.
    pub position: Vec2,
    /// Units per second.
    pub velocity: Vec2,
    /// Units per second squared.
    pub acceleration: Vec2,
    /// Facing angle in degrees, kept in `[0, 360)`.
    pub heading: f32,
    /// Degrees per second.
    pub rotation: f32,
}

impl Kinematics {
    /// Creates kinematic state from all five components.
    #[must_use]
    pub const fn new(
        position: Vec2,
        velocity: Vec2,
        acceleration: Vec2,
        heading: f32,
        rotation: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            acceleration,
            heading,
            rotation,
        }
    }

    /// At rest at the given position, facing +x.
    #[must_use]
    pub fn at_position(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Unit vector along the current heading.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading.to_radians())
    }

    /// Advances the state by `dt_ms` milliseconds and wraps the position.
    ///
    /// A zero duration leaves the state untouched.
    pub fn integrate(&mut self, dt_ms: u32, bounds: &WorldBounds) {
        if dt_ms == 0 {
            return;
        }
        let t = millis_to_seconds(dt_ms);
        self.velocity += self.acceleration * t;
        self.position = bounds.wrap(self.position + self.velocity * t);
        self.heading = wrap_heading(self.heading + self.rotation * t);
    }
}

fn wrap_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // tiny negative inputs round up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
