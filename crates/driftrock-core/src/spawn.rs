//! Entity construction with configured sizes and seeded randomness.

use drift::{BoundingShape, Entity, Kinematics, WorldBounds};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::GameConfig;

/// Thrust and turn rate picked by the demo pilot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoAction {
    /// Thrust to apply.
    pub thrust: f32,
    /// Turn rate to apply.
    pub rotation: f32,
}

/// Builds ships, asteroids and explosions.
///
/// All randomness comes from one [`ChaCha8Rng`] seeded from the config, so a
/// session replays identically for the same seed and inputs.
#[derive(Debug, Clone)]
pub struct EntityFactory {
    bounds: WorldBounds,
    seed: u64,
    rng: ChaCha8Rng,
    ship_radius: f32,
    asteroid_radius: f32,
    asteroid_speed: f32,
    asteroid_max_rotation: f32,
    safe_radius: f32,
    explosion_lifetime_ms: u32,
    demo_thrust: f32,
    demo_rotation: f32,
}

impl EntityFactory {
    /// Creates a factory seeded from `config.seed`.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            bounds: config.bounds(),
            seed: config.seed,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            ship_radius: config.ship_radius,
            asteroid_radius: config.asteroid_radius,
            asteroid_speed: config.asteroid_speed,
            asteroid_max_rotation: config.asteroid_max_rotation,
            safe_radius: config.safe_radius,
            explosion_lifetime_ms: config.explosion_lifetime_ms,
            demo_thrust: config.demo_thrust,
            demo_rotation: config.demo_rotation,
        }
    }

    /// Rewinds the random stream to the configured seed.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// A ship at rest in the centre.
    #[must_use]
    pub fn spaceship(&self) -> Entity {
        Entity::spaceship().with_shape(BoundingShape::sphere(self.ship_radius))
    }

    /// An asteroid at a random spot outside the safe zone, drifting in a
    /// random direction.
    pub fn asteroid(&mut self) -> Entity {
        let half = self.bounds.half_extents();
        let mut position = Vec2::new(
            self.rng.gen_range(-half.x..half.x),
            self.rng.gen_range(-half.y..half.y),
        );
        if position.length() < self.safe_radius {
            let away = position.try_normalize().unwrap_or(Vec2::X);
            position = self.bounds.wrap(away * self.safe_radius);
        }

        let course: f32 = self.rng.gen_range(0.0..360.0);
        let heading: f32 = self.rng.gen_range(0.0..360.0);
        let rotation = symmetric(&mut self.rng, self.asteroid_max_rotation);
        let kinematics = Kinematics::new(
            position,
            Vec2::from_angle(course.to_radians()) * self.asteroid_speed,
            Vec2::ZERO,
            heading,
            rotation,
        );
        Entity::asteroid(kinematics).with_shape(BoundingShape::sphere(self.asteroid_radius))
    }

    /// An explosion where `victim` was.
    #[must_use]
    pub fn explosion_for(&self, victim: &Entity) -> Entity {
        Entity::explosion(victim.position(), victim.heading(), self.explosion_lifetime_ms)
    }

    /// Picks the next demo pilot input.
    pub fn demo_action(&mut self) -> DemoAction {
        DemoAction {
            thrust: symmetric(&mut self.rng, self.demo_thrust),
            rotation: symmetric(&mut self.rng, self.demo_rotation),
        }
    }
}

fn symmetric(rng: &mut ChaCha8Rng, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(-max..=max)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift::EntityTag;
    use proptest::prelude::*;

    #[test]
    fn asteroids_spawn_outside_safe_zone_and_inside_arena() {
        let config = GameConfig::default();
        let mut factory = EntityFactory::new(&config);
        for _ in 0..200 {
            let asteroid = factory.asteroid();
            assert_eq!(asteroid.tag(), EntityTag::Asteroid);
            assert!(asteroid.position().length() >= config.safe_radius - 1e-3);
            assert!(config.bounds().contains(asteroid.position()));
            let speed = asteroid.kinematics().velocity.length();
            assert!((speed - config.asteroid_speed).abs() < 1e-3);
        }
    }

    #[test]
    fn same_seed_same_asteroids() {
        let config = GameConfig::default();
        let mut a = EntityFactory::new(&config);
        let mut b = EntityFactory::new(&config);
        for _ in 0..10 {
            assert_eq!(a.asteroid(), b.asteroid());
        }
    }

    #[test]
    fn reset_rewinds_stream() {
        let mut factory = EntityFactory::new(&GameConfig::default());
        let first = factory.asteroid();
        factory.asteroid();
        factory.reset();
        assert_eq!(factory.asteroid(), first);
    }

    #[test]
    fn demo_actions_stay_in_range() {
        let config = GameConfig::default();
        let mut factory = EntityFactory::new(&config);
        for _ in 0..100 {
            let action = factory.demo_action();
            assert!(action.thrust.abs() <= config.demo_thrust);
            assert!(action.rotation.abs() <= config.demo_rotation);
        }
    }

    #[test]
    fn zero_ranges_give_zero() {
        let config = GameConfig {
            asteroid_speed: 0.0,
            asteroid_max_rotation: 0.0,
            demo_thrust: 0.0,
            ..GameConfig::default()
        };
        let mut factory = EntityFactory::new(&config);
        let asteroid = factory.asteroid();
        assert_eq!(asteroid.kinematics().velocity, Vec2::ZERO);
        assert_eq!(asteroid.kinematics().rotation, 0.0);
        assert_eq!(factory.demo_action().thrust, 0.0);
    }

    #[test]
    fn explosion_takes_victim_pose() {
        let mut factory = EntityFactory::new(&GameConfig::default());
        let victim = factory.asteroid();
        let boom = factory.explosion_for(&victim);
        assert_eq!(boom.tag(), EntityTag::Explosion);
        assert_eq!(boom.position(), victim.position());
        assert_eq!(boom.heading(), victim.heading());
        assert!(boom.shape().is_none());
    }

    proptest! {
        #[test]
        fn any_seed_places_asteroids_legally(
            seed in any::<u64>(),
            width in 100.0f32..400.0,
            height in 100.0f32..400.0,
        ) {
            let config = GameConfig {
                seed,
                world_width: width,
                world_height: height,
                ..GameConfig::default()
            };
            let mut factory = EntityFactory::new(&config);
            for _ in 0..20 {
                let position = factory.asteroid().position();
                prop_assert!(config.bounds().contains(position), "{position:?} outside arena");
                prop_assert!(
                    position.length() >= config.safe_radius - 1e-3,
                    "{position:?} inside safe zone"
                );
            }
        }
    }
}
