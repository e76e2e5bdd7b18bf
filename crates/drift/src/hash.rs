//! State hashing for determinism checks.
//!
//! Two worlds driven by the same inputs must hash identically after every
//! tick. Floats are hashed by bit pattern.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::entity::{Entity, EntityInner};
use crate::kinematics::Kinematics;
use crate::shape::BoundingShape;
use crate::world::World;

/// Computes a hash of the tick, the live set and the pending timer count.
#[must_use]
pub fn hash_world(world: &World) -> u64 {
    let mut hasher = DefaultHasher::new();

    world.tick().hash(&mut hasher);
    world.len().hash(&mut hasher);
    for (id, entity) in world.iter() {
        id.hash(&mut hasher);
        hash_entity(entity, &mut hasher);
    }
    world.timers().len().hash(&mut hasher);

    hasher.finish()
}

fn hash_entity<H: Hasher>(entity: &Entity, hasher: &mut H) {
    entity.tag().hash(hasher);
    entity.is_visible().hash(hasher);
    hash_kinematics(entity.kinematics(), hasher);

    match entity.shape() {
        None => 0u8.hash(hasher),
        Some(BoundingShape::Sphere { radius }) => {
            1u8.hash(hasher);
            radius.to_bits().hash(hasher);
        }
        Some(BoundingShape::Box { half_extents }) => {
            2u8.hash(hasher);
            half_extents.x.to_bits().hash(hasher);
            half_extents.y.to_bits().hash(hasher);
        }
    }

    match entity.inner() {
        EntityInner::Spaceship(ship) => ship.thrust.to_bits().hash(hasher),
        EntityInner::Asteroid(_) => {}
        EntityInner::Bullet(state) => state.lifetime.remaining_ms.hash(hasher),
        EntityInner::Explosion(state) => state.lifetime.remaining_ms.hash(hasher),
    }
}

fn hash_kinematics<H: Hasher>(k: &Kinematics, hasher: &mut H) {
    for v in [k.position, k.velocity, k.acceleration] {
        v.x.to_bits().hash(hasher);
        v.y.to_bits().hash(hasher);
    }
    k.heading.to_bits().hash(hasher);
    k.rotation.to_bits().hash(hasher);
}
