//! # Drift
//!
//! Deterministic entity/world simulation substrate for wrap-around arcade
//! arenas.
//!
//! Drift owns a set of moving entities with optional bounding shapes and
//! advances them in fixed ticks:
//!
//! - **Integration**: explicit Euler motion in a toroidal arena
//! - **Collisions**: pairwise overlap tests with per-kind reactions
//! - **Deferred mutation**: additions and removals requested mid-tick are
//!   queued and applied at well-defined points
//! - **Timers**: one-shot integer-tagged timers
//! - **Listeners**: weakly held observers of lifecycle events and timers
//!
//! ## Quick Start
//!
//! ```
//! use drift::{BoundingShape, Entity, Kinematics, World, WorldBounds};
//! use glam::Vec2;
//!
//! let mut world = World::new(WorldBounds::new(200.0, 200.0));
//! let mut motion = Kinematics::at_position(Vec2::new(90.0, 0.0));
//! motion.velocity = Vec2::new(20.0, 0.0);
//! let rock = world.add_object(Entity::asteroid(motion).with_shape(BoundingShape::sphere(10.0)));
//!
//! world.update(1000).unwrap();
//!
//! // Left through the right edge, back in on the left.
//! let x = world.get(rock).unwrap().position().x;
//! assert!((x - (-90.0)).abs() < 1e-3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod entity;
pub mod error;
pub mod hash;
pub mod kinematics;
pub mod listener;
pub mod queue;
pub mod shape;
pub mod timer;
pub mod world;

// Re-exports for convenience
pub use entity::{BulletSpec, Contact, Entity, EntityId, EntityInner, EntityTag, Lifetime};
pub use error::{ListenerFailure, WorldError, WorldEvent};
pub use hash::hash_world;
pub use kinematics::{Kinematics, WorldBounds};
pub use listener::{
    Commands, ListenerError, ListenerId, Subscribers, TimerListener, WorldContext, WorldListener,
};
pub use queue::MutationQueue;
pub use shape::BoundingShape;
pub use timer::{TimerQueue, TimerTag};
pub use world::World;
