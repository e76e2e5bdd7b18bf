//! Entity types for the arena simulation.
//!
//! - [`EntityId`]: stable opaque handle, usable as a map or set key
//! - [`EntityTag`]: closed kind classification used for dispatch and filtering
//! - [`EntityInner`]: type-safe storage for kind-specific state
//! - [`Entity`]: kinematics, optional bounding shape, visibility and inner state
//!
//! Entities never hold a reference to the world. Everything they want to
//! change outside themselves (removing themselves, spawning bullets) goes
//! through a [`MutationQueue`] and takes effect in the world's apply phase.
//!
//! # Example
//!
//! ```
//! use drift::entity::{Entity, EntityTag};
//! use drift::kinematics::Kinematics;
//! use drift::shape::BoundingShape;
//! use glam::Vec2;
//!
//! let asteroid = Entity::asteroid(Kinematics::at_position(Vec2::ZERO))
//!     .with_shape(BoundingShape::sphere(10.0));
//! let bullet = Entity::bullet(Kinematics::at_position(Vec2::new(5.0, 0.0)), 2000)
//!     .with_shape(BoundingShape::sphere(1.0));
//!
//! assert_eq!(asteroid.tag(), EntityTag::Asteroid);
//! assert!(asteroid.collision_test(&bullet));
//! ```

pub mod components;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::kinematics::{Kinematics, WorldBounds};
use crate::queue::MutationQueue;
use crate::shape::BoundingShape;

pub use components::{
    AsteroidState, BulletSpec, BulletState, ExplosionState, Lifetime, SpaceshipState,
};

/// Unique identifier for an entity.
///
/// Ids are allocated monotonically when an entity is queued for addition and
/// never reused within a world, so a stale id can only ever miss.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The player's ship.
    Spaceship,
    /// A drifting rock.
    Asteroid,
    /// A shot fired by a ship.
    Bullet,
    /// A short-lived visual effect with no collision.
    Explosion,
}

impl EntityTag {
    /// Returns true if entities of these two kinds can collide.
    ///
    /// The relation is symmetric: asteroids hit ships and bullets, nothing
    /// else collides.
    #[must_use]
    pub const fn interacts_with(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Asteroid, Self::Spaceship | Self::Bullet)
                | (Self::Spaceship | Self::Bullet, Self::Asteroid)
        )
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spaceship => write!(f, "Spaceship"),
            Self::Asteroid => write!(f, "Asteroid"),
            Self::Bullet => write!(f, "Bullet"),
            Self::Explosion => write!(f, "Explosion"),
        }
    }
}

/// Type-safe storage for kind-specific state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Ship thrust.
    Spaceship(SpaceshipState),
    /// Asteroid state.
    Asteroid(AsteroidState),
    /// Bullet lifetime.
    Bullet(BulletState),
    /// Explosion lifetime.
    Explosion(ExplosionState),
}

impl EntityInner {
    /// Returns the corresponding `EntityTag` for this inner storage.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        match self {
            Self::Spaceship(_) => EntityTag::Spaceship,
            Self::Asteroid(_) => EntityTag::Asteroid,
            Self::Bullet(_) => EntityTag::Bullet,
            Self::Explosion(_) => EntityTag::Explosion,
        }
    }

    /// Returns the ship state, if this is a spaceship.
    #[must_use]
    pub const fn as_spaceship(&self) -> Option<&SpaceshipState> {
        match self {
            Self::Spaceship(state) => Some(state),
            _ => None,
        }
    }

    /// Returns the mutable ship state, if this is a spaceship.
    #[must_use]
    pub fn as_spaceship_mut(&mut self) -> Option<&mut SpaceshipState> {
        match self {
            Self::Spaceship(state) => Some(state),
            _ => None,
        }
    }

    /// Returns the lifetime of bullets and explosions.
    #[must_use]
    pub const fn lifetime(&self) -> Option<&Lifetime> {
        match self {
            Self::Bullet(state) => Some(&state.lifetime),
            Self::Explosion(state) => Some(&state.lifetime),
            Self::Spaceship(_) | Self::Asteroid(_) => None,
        }
    }

    fn lifetime_mut(&mut self) -> Option<&mut Lifetime> {
        match self {
            Self::Bullet(state) => Some(&mut state.lifetime),
            Self::Explosion(state) => Some(&mut state.lifetime),
            Self::Spaceship(_) | Self::Asteroid(_) => None,
        }
    }
}

/// Another entity touched during a collision pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    /// The other entity.
    pub id: EntityId,
    /// Its kind.
    pub tag: EntityTag,
}

impl Contact {
    /// Creates a contact record.
    #[must_use]
    pub const fn new(id: EntityId, tag: EntityTag) -> Self {
        Self { id, tag }
    }
}

/// A simulated object in the arena.
///
/// # Invariants
///
/// - The kind is fixed at construction (`tag()` derives from `inner`)
/// - Kinematic state changes only through `update`, the action methods and
///   `reset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    inner: EntityInner,
    kinematics: Kinematics,
    shape: Option<BoundingShape>,
    visible: bool,
}

impl Entity {
    /// Creates a visible entity without a bounding shape.
    #[must_use]
    pub const fn new(inner: EntityInner, kinematics: Kinematics) -> Self {
        Self {
            inner,
            kinematics,
            shape: None,
            visible: true,
        }
    }

    /// A ship at rest in the centre of the arena.
    #[must_use]
    pub fn spaceship() -> Self {
        Self::new(
            EntityInner::Spaceship(SpaceshipState::default()),
            Kinematics::default(),
        )
    }

    /// An asteroid with the given motion.
    #[must_use]
    pub const fn asteroid(kinematics: Kinematics) -> Self {
        Self::new(EntityInner::Asteroid(AsteroidState {}), kinematics)
    }

    /// A bullet that removes itself after `lifetime_ms`.
    #[must_use]
    pub const fn bullet(kinematics: Kinematics, lifetime_ms: u32) -> Self {
        Self::new(
            EntityInner::Bullet(BulletState {
                lifetime: Lifetime::new(lifetime_ms),
            }),
            kinematics,
        )
    }

    /// A stationary explosion that removes itself after `lifetime_ms`.
    #[must_use]
    pub fn explosion(position: Vec2, heading: f32, lifetime_ms: u32) -> Self {
        let mut kinematics = Kinematics::at_position(position);
        kinematics.heading = heading;
        Self::new(
            EntityInner::Explosion(ExplosionState {
                lifetime: Lifetime::new(lifetime_ms),
            }),
            kinematics,
        )
    }

    /// Attaches a bounding shape.
    #[must_use]
    pub fn with_shape(mut self, shape: BoundingShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Returns the entity's kind.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.inner.tag()
    }

    /// Returns the kind-specific state.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns the mutable kind-specific state.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Returns the kinematic state.
    #[must_use]
    pub const fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Returns the mutable kinematic state.
    #[must_use]
    pub fn kinematics_mut(&mut self) -> &mut Kinematics {
        &mut self.kinematics
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    /// Current heading in degrees.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.kinematics.heading
    }

    /// The bounding shape, if any.
    #[must_use]
    pub const fn shape(&self) -> Option<&BoundingShape> {
        self.shape.as_ref()
    }

    /// Replaces or clears the bounding shape.
    pub fn set_shape(&mut self, shape: Option<BoundingShape>) {
        self.shape = shape;
    }

    /// Whether the renderer should draw this entity.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Shows or hides the entity. Hidden entities still collide.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Sets forward thrust. No effect on anything but a spaceship.
    pub fn thrust(&mut self, thrust: f32) {
        if let Some(ship) = self.inner.as_spaceship_mut() {
            ship.thrust = thrust;
        }
    }

    /// Sets the rotation rate in degrees per second. No effect on anything
    /// but a spaceship.
    pub fn rotate(&mut self, rotation: f32) {
        if self.inner.as_spaceship().is_some() {
            self.kinematics.rotation = rotation;
        }
    }

    /// Builds a bullet leaving the ship's nose.
    ///
    /// Returns `None` for anything that is not a spaceship. The caller queues
    /// the bullet; firing never touches the live set directly.
    #[must_use]
    pub fn fire(&self, spec: &BulletSpec) -> Option<Self> {
        self.inner.as_spaceship()?;
        let direction = self.kinematics.direction();
        let kinematics = Kinematics::new(
            self.kinematics.position + direction * spec.muzzle_offset,
            self.kinematics.velocity + direction * spec.speed,
            Vec2::ZERO,
            self.kinematics.heading,
            0.0,
        );
        Some(Self::bullet(kinematics, spec.lifetime_ms).with_shape(BoundingShape::sphere(spec.radius)))
    }

    /// Puts the entity back at the centre, at rest, facing +x.
    pub fn reset(&mut self) {
        self.kinematics = Kinematics::default();
        if let Some(ship) = self.inner.as_spaceship_mut() {
            ship.thrust = 0.0;
        }
    }

    /// Advances the entity by one tick.
    ///
    /// Ships turn thrust into acceleration along their heading, everything is
    /// integrated and wrapped, and bullets and explosions whose lifetime runs
    /// out flag themselves for removal. A zero `dt_ms` changes nothing.
    pub fn update(
        &mut self,
        id: EntityId,
        dt_ms: u32,
        bounds: &WorldBounds,
        queue: &mut MutationQueue,
    ) {
        if dt_ms == 0 {
            return;
        }
        if let Some(ship) = self.inner.as_spaceship() {
            self.kinematics.acceleration = self.kinematics.direction() * ship.thrust;
        }
        self.kinematics.integrate(dt_ms, bounds);

        if let Some(lifetime) = self.inner.lifetime_mut() {
            if lifetime.tick(dt_ms) {
                queue.flag_for_removal(id);
            }
        }
    }

    /// Tests this entity against `other` at their current positions.
    ///
    /// False when either side has no shape or the kinds do not interact.
    #[must_use]
    pub fn collision_test(&self, other: &Self) -> bool {
        if !self.tag().interacts_with(other.tag()) {
            return false;
        }
        match (&self.shape, &other.shape) {
            (Some(a), Some(b)) => a.overlaps(self.position(), b, other.position()),
            _ => false,
        }
    }

    /// Reacts to everything this entity touched in the current pass.
    ///
    /// Ships, asteroids and bullets are destroyed by any contact.
    pub fn on_collision(&self, id: EntityId, contacts: &[Contact], queue: &mut MutationQueue) {
        if contacts.is_empty() {
            return;
        }
        match self.tag() {
            EntityTag::Spaceship | EntityTag::Asteroid | EntityTag::Bullet => {
                queue.flag_for_removal(id);
            }
            EntityTag::Explosion => {}
        }
    }
}
