//! Game configuration.
//!
//! Every tunable of a session lives in [`GameConfig`]. The defaults reproduce
//! the classic rules: ten asteroids to start, two more per level, three lives
//! and ten points per asteroid. Configs are plain serde documents and can be
//! loaded from JSON; missing fields fall back to their defaults.
//!
//! # Example
//!
//! ```
//! use driftrock_core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "lives": 5, "seed": 7 }"#).unwrap();
//! assert_eq!(config.lives, 5);
//! assert_eq!(config.initial_asteroids, 10);
//! ```

use std::fs;
use std::path::Path;

use drift::{BulletSpec, WorldBounds};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid JSON for a config.
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Delays of the phase timers, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTimings {
    /// First demo action after the session starts.
    pub demo_first_ms: u32,
    /// Interval between demo actions.
    pub demo_interval_ms: u32,
    /// Delay between the start request and play.
    pub start_game_ms: u32,
    /// Delay before a destroyed ship comes back.
    pub respawn_ms: u32,
    /// Delay between clearing the field and the next wave.
    pub next_level_ms: u32,
    /// Delay between losing the last life and the game-over banner.
    pub game_over_ms: u32,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            demo_first_ms: 100,
            demo_interval_ms: 500,
            start_game_ms: 100,
            respawn_ms: 1000,
            next_level_ms: 500,
            game_over_ms: 500,
        }
    }
}

/// Configuration of an asteroids session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Arena width.
    pub world_width: f32,
    /// Arena height.
    pub world_height: f32,
    /// Seed for asteroid placement and demo actions.
    pub seed: u64,

    /// Asteroids in the first wave.
    pub initial_asteroids: u32,
    /// Extra asteroids per level reached.
    pub asteroids_per_level: u32,
    /// Lives at the start of a game.
    pub lives: u32,
    /// Points per destroyed asteroid.
    pub points_per_asteroid: u64,

    /// Ship bounding sphere radius.
    pub ship_radius: f32,
    /// Asteroid bounding sphere radius.
    pub asteroid_radius: f32,
    /// Bullet bounding sphere radius.
    pub bullet_radius: f32,

    /// Drift speed of new asteroids.
    pub asteroid_speed: f32,
    /// Largest spin of new asteroids, degrees per second either way.
    pub asteroid_max_rotation: f32,
    /// Asteroids never spawn closer than this to the centre.
    pub safe_radius: f32,

    /// Muzzle speed of bullets.
    pub bullet_speed: f32,
    /// Bullet lifetime.
    pub bullet_lifetime_ms: u32,
    /// Distance ahead of the ship where bullets appear.
    pub muzzle_offset: f32,
    /// Explosion lifetime.
    pub explosion_lifetime_ms: u32,

    /// Thrust applied while the player holds thrust.
    pub ship_thrust: f32,
    /// Turn rate applied while the player holds a turn key.
    pub ship_rotation: f32,
    /// Largest thrust the demo pilot picks, either way.
    pub demo_thrust: f32,
    /// Largest turn rate the demo pilot picks, either way.
    pub demo_rotation: f32,

    /// Phase timer delays.
    pub timings: PhaseTimings,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_width: 200.0,
            world_height: 200.0,
            seed: 42,
            initial_asteroids: 10,
            asteroids_per_level: 2,
            lives: 3,
            points_per_asteroid: 10,
            ship_radius: 4.0,
            asteroid_radius: 10.0,
            bullet_radius: 2.0,
            asteroid_speed: 10.0,
            asteroid_max_rotation: 90.0,
            safe_radius: 30.0,
            bullet_speed: 30.0,
            bullet_lifetime_ms: 2000,
            muzzle_offset: 4.0,
            explosion_lifetime_ms: 500,
            ship_thrust: 10.0,
            ship_rotation: 90.0,
            demo_thrust: 20.0,
            demo_rotation: 360.0,
            timings: PhaseTimings::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed documents and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the config as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks every value for range errors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        non_negative("ship_radius", self.ship_radius)?;
        non_negative("asteroid_radius", self.asteroid_radius)?;
        non_negative("bullet_radius", self.bullet_radius)?;
        non_negative("asteroid_speed", self.asteroid_speed)?;
        non_negative("asteroid_max_rotation", self.asteroid_max_rotation)?;
        non_negative("safe_radius", self.safe_radius)?;
        non_negative("bullet_speed", self.bullet_speed)?;
        non_negative("muzzle_offset", self.muzzle_offset)?;
        non_negative("ship_thrust", self.ship_thrust)?;
        non_negative("ship_rotation", self.ship_rotation)?;
        non_negative("demo_thrust", self.demo_thrust)?;
        non_negative("demo_rotation", self.demo_rotation)?;

        let half_min = self.world_width.min(self.world_height) * 0.5;
        if self.safe_radius >= half_min {
            return Err(ConfigError::Invalid(format!(
                "safe_radius {} must be smaller than half the arena ({half_min})",
                self.safe_radius
            )));
        }
        if self.bullet_lifetime_ms == 0 {
            return Err(ConfigError::Invalid(
                "bullet_lifetime_ms must be positive".to_string(),
            ));
        }
        if self.explosion_lifetime_ms == 0 {
            return Err(ConfigError::Invalid(
                "explosion_lifetime_ms must be positive".to_string(),
            ));
        }
        if self.lives == 0 {
            return Err(ConfigError::Invalid("lives must be positive".to_string()));
        }
        Ok(())
    }

    /// Arena bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.world_width, self.world_height)
    }

    /// How the ship's gun builds bullets.
    #[must_use]
    pub fn bullet_spec(&self) -> BulletSpec {
        BulletSpec {
            speed: self.bullet_speed,
            lifetime_ms: self.bullet_lifetime_ms,
            radius: self.bullet_radius,
            muzzle_offset: self.muzzle_offset,
        }
    }

    /// Asteroids in the wave for `level` (level 0 is the opening wave).
    #[must_use]
    pub fn asteroids_for_level(&self, level: u32) -> u32 {
        self.initial_asteroids
            .saturating_add(self.asteroids_per_level.saturating_mul(level))
    }
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.asteroids_for_level(0), 10);
        assert_eq!(config.asteroids_for_level(3), 16);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            GameConfig::from_json_str(r#"{ "timings": { "respawn_ms": 250 } }"#).unwrap();
        assert_eq!(config.timings.respawn_ms, 250);
        assert_eq!(config.timings.next_level_ms, 500);
        assert_eq!(config.lives, 3);
    }

    #[test]
    fn json_roundtrip() {
        let mut config = GameConfig::default();
        config.seed = 99;
        config.asteroid_speed = 0.0;
        let json = config.to_json_pretty().unwrap();
        assert_eq!(GameConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = GameConfig::from_json_str("{ lives: 3").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = GameConfig::from_json_str(r#"{ "world_width": -5.0 }"#).unwrap_err();
        assert!(err.to_string().contains("world_width"));

        let err = GameConfig::from_json_str(r#"{ "safe_radius": 150.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json_str(r#"{ "lives": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("lives"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn bullet_spec_follows_config() {
        let config = GameConfig {
            bullet_speed: 50.0,
            bullet_lifetime_ms: 750,
            ..GameConfig::default()
        };
        let spec = config.bullet_spec();
        assert_eq!(spec.speed, 50.0);
        assert_eq!(spec.lifetime_ms, 750);
        assert_eq!(spec.radius, 2.0);
    }

    proptest! {
        #[test]
        fn each_level_adds_a_fixed_batch(
            base in 0u32..100,
            per_level in 0u32..20,
            level in 0u32..1_000,
        ) {
            let config = GameConfig {
                initial_asteroids: base,
                asteroids_per_level: per_level,
                ..GameConfig::default()
            };
            prop_assert_eq!(config.asteroids_for_level(level), base + per_level * level);
            prop_assert_eq!(
                config.asteroids_for_level(level + 1) - config.asteroids_for_level(level),
                per_level
            );
        }
    }
}
