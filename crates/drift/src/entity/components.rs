//! Per-kind state carried by entities.
//!
//! Shared kinematics live on [`Entity`](super::Entity); the structs here only
//! hold what a single kind needs on top of that.

use serde::{Deserialize, Serialize};

/// State of the player's ship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpaceshipState {
    /// Forward thrust in units per second squared, applied along the heading.
    pub thrust: f32,
}

/// State of an asteroid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsteroidState {}

/// A countdown that expires once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Milliseconds left before the owner removes itself.
    pub remaining_ms: u32,
}

impl Lifetime {
    /// Creates a lifetime of the given length.
    #[must_use]
    pub const fn new(remaining_ms: u32) -> Self {
        Self { remaining_ms }
    }

    /// Counts down by `dt_ms` and returns true once nothing is left.
    pub fn tick(&mut self, dt_ms: u32) -> bool {
        self.remaining_ms = self.remaining_ms.saturating_sub(dt_ms);
        self.remaining_ms == 0
    }
}

/// State of a bullet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletState {
    /// Time until the bullet fizzles out.
    pub lifetime: Lifetime,
}

/// State of an explosion effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionState {
    /// Time until the effect is done.
    pub lifetime: Lifetime,
}

/// How a ship's gun builds bullets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSpec {
    /// Muzzle speed added to the ship's own velocity.
    pub speed: f32,
    /// Lifetime in milliseconds.
    pub lifetime_ms: u32,
    /// Bounding sphere radius.
    pub radius: f32,
    /// Distance ahead of the ship's centre where the bullet appears.
    pub muzzle_offset: f32,
}

impl Default for BulletSpec {
    fn default() -> Self {
        Self {
            speed: 30.0,
            lifetime_ms: 2000,
            radius: 2.0,
            muzzle_offset: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_expires_exactly_once_at_zero() {
        let mut life = Lifetime::new(100);
        assert!(!life.tick(60));
        assert_eq!(life.remaining_ms, 40);
        assert!(life.tick(40));
        assert_eq!(life.remaining_ms, 0);
    }

    #[test]
    fn lifetime_saturates() {
        let mut life = Lifetime::new(10);
        assert!(life.tick(1000));
        assert_eq!(life.remaining_ms, 0);
    }

    #[test]
    fn zero_tick_does_not_expire_running_lifetime() {
        let mut life = Lifetime::new(10);
        assert!(!life.tick(0));
    }
}
