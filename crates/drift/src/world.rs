//! The world: live entity set, per-tick update and listener fan-out.
//!
//! # Tick order
//!
//! [`World::update`] runs these phases, in this order, every call:
//!
//! 0. admit additions queued since the previous tick ("object added")
//! 1. integrate every live entity
//! 2. test every unordered pair of live entities in ascending id order and
//!    hand each entity its full contact list
//! 3. apply queued removals in request order ("object removed")
//! 4. apply queued additions in request order ("object added")
//! 5. notify "world updated"
//! 6. advance timers (only for a non-zero `dt`) and notify timer listeners
//!
//! The live set is never touched during phases 1 and 2. Requests made there
//! are queued and take effect in phases 3 and 4. Requests made by listeners in
//! phases 3 to 6 take effect on the next tick, except additions requested in
//! phase 3, which are admitted in phase 4.
//!
//! Collision detection is a plain O(n²) pair scan.
//!
//! # Example
//!
//! ```
//! use drift::entity::{Entity, EntityTag};
//! use drift::kinematics::{Kinematics, WorldBounds};
//! use drift::shape::BoundingShape;
//! use drift::world::World;
//! use glam::Vec2;
//!
//! let mut world = World::new(WorldBounds::default());
//! let rock = world.add_object(
//!     Entity::asteroid(Kinematics::at_position(Vec2::ZERO)).with_shape(BoundingShape::sphere(10.0)),
//! );
//! let shot = world.add_object(
//!     Entity::bullet(Kinematics::at_position(Vec2::new(5.0, 0.0)), 2000)
//!         .with_shape(BoundingShape::sphere(1.0)),
//! );
//! assert!(world.get(rock).is_none());
//!
//! world.update(0).unwrap();
//!
//! assert_eq!(world.last_contacts(), &[(rock, shot)]);
//! assert_eq!(world.count_of(EntityTag::Asteroid), 0);
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, debug_span, trace, warn};

use crate::entity::{Contact, Entity, EntityId, EntityTag};
use crate::error::{ListenerFailure, WorldError, WorldEvent};
use crate::kinematics::WorldBounds;
use crate::listener::{
    Commands, ListenerError, ListenerId, Subscribers, TimerListener, WorldContext, WorldListener,
};
use crate::queue::MutationQueue;
use crate::timer::{TimerQueue, TimerTag};

/// Owner of every live entity, the deferred queues and the timers.
#[derive(Debug)]
pub struct World {
    bounds: WorldBounds,
    entities: BTreeMap<EntityId, Entity>,
    pending: MutationQueue,
    timers: TimerQueue,
    world_listeners: Subscribers<dyn WorldListener>,
    timer_listeners: Subscribers<dyn TimerListener>,
    last_contacts: Vec<(EntityId, EntityId)>,
    tick: u64,
}

impl World {
    /// Creates an empty world with the given arena bounds.
    #[must_use]
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            bounds,
            entities: BTreeMap::new(),
            pending: MutationQueue::new(),
            timers: TimerQueue::new(),
            world_listeners: Subscribers::new(),
            timer_listeners: Subscribers::new(),
            last_contacts: Vec::new(),
            tick: 0,
        }
    }

    // =========================================================================
    // Mutation requests
    // =========================================================================

    /// Queues an entity for addition.
    ///
    /// The entity becomes live, and "object added" fires, at the start of the
    /// next [`update`](Self::update).
    pub fn add_object(&mut self, entity: Entity) -> EntityId {
        let id = self.pending.add_object(entity);
        trace!(%id, "queued addition");
        id
    }

    /// Queues a live entity for removal.
    ///
    /// Returns false, and does nothing, if `id` is not live or is already
    /// flagged. The entity keeps colliding until the removal phase.
    pub fn flag_for_removal(&mut self, id: EntityId) -> bool {
        self.entities.contains_key(&id) && self.pending.flag_for_removal(id)
    }

    /// Schedules a one-shot timer.
    pub fn schedule(&mut self, duration_ms: u32, tag: TimerTag) {
        self.timers.schedule(duration_ms, tag);
    }

    /// Cancels every pending timer with `tag`.
    pub fn cancel_timer(&mut self, tag: TimerTag) -> usize {
        self.timers.cancel(tag)
    }

    /// Drops every entity, pending request and timer without notifying
    /// anyone. Listeners stay subscribed and ids are not reused.
    pub fn clear(&mut self) {
        debug!(live = self.entities.len(), "clearing world");
        self.entities.clear();
        self.pending.clear();
        self.timers.clear();
        self.last_contacts.clear();
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    /// Subscribes a world listener. The world keeps only a weak handle.
    pub fn add_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: WorldListener + 'static,
    {
        let shared: Rc<RefCell<dyn WorldListener>> = listener.clone();
        self.world_listeners.subscribe(Rc::downgrade(&shared))
    }

    /// Unsubscribes a world listener. Unknown ids are a no-op.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.world_listeners.unsubscribe(id)
    }

    /// Subscribes a timer listener. The world keeps only a weak handle.
    pub fn add_timer_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: TimerListener + 'static,
    {
        let shared: Rc<RefCell<dyn TimerListener>> = listener.clone();
        self.timer_listeners.subscribe(Rc::downgrade(&shared))
    }

    /// Unsubscribes a timer listener. Unknown ids are a no-op.
    pub fn remove_timer_listener(&mut self, id: ListenerId) -> bool {
        self.timer_listeners.unsubscribe(id)
    }

    /// Returns true if the world listener `id` is subscribed and alive.
    #[must_use]
    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.world_listeners.contains(id)
    }

    /// Number of live world listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.world_listeners.len()
    }

    /// Number of live timer listeners.
    #[must_use]
    pub fn timer_listener_count(&self) -> usize {
        self.timer_listeners.len()
    }

    // =========================================================================
    // Read access
    // =========================================================================

    /// Looks up a live entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up a live entity for an action (thrust, rotate, reset).
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns true if `id` is in the live set.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns true if `id` is waiting to be removed.
    #[must_use]
    pub fn is_flagged(&self, id: EntityId) -> bool {
        self.pending.is_flagged(id)
    }

    /// Returns true if `id` is queued but not yet live.
    #[must_use]
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending.is_pending_addition(id)
    }

    /// Iterates live entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of live entities of the given kind.
    #[must_use]
    pub fn count_of(&self, tag: EntityTag) -> usize {
        self.entities.values().filter(|e| e.tag() == tag).count()
    }

    /// Number of completed updates.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Arena bounds.
    #[must_use]
    pub const fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Pairs that collided in the last collision pass, lower id first.
    #[must_use]
    pub fn last_contacts(&self) -> &[(EntityId, EntityId)] {
        &self.last_contacts
    }

    /// Pending timers.
    #[must_use]
    pub const fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Advances the world by `dt_ms` milliseconds.
    ///
    /// A zero `dt_ms` still runs collisions and every dispatch but moves
    /// nothing and fires no timer.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Listener`] if any listener failed. The tick still
    /// ran to completion and every other listener was notified.
    pub fn update(&mut self, dt_ms: u32) -> Result<(), WorldError> {
        let span = debug_span!("world.update", tick = self.tick, dt_ms);
        let _enter = span.enter();

        let horizon = self.timers.sequence();
        let mut failures = Vec::new();

        self.apply_additions(&mut failures);
        self.integrate(dt_ms);
        self.detect_collisions();
        self.apply_removals(&mut failures);
        self.apply_additions(&mut failures);
        self.notify_world_updated(&mut failures);
        self.fire_timers(dt_ms, horizon, &mut failures);

        let tick = self.tick;
        self.tick += 1;

        if failures.is_empty() {
            Ok(())
        } else {
            warn!(tick, count = failures.len(), "listener failures during tick");
            Err(WorldError::Listener { tick, failures })
        }
    }

    fn integrate(&mut self, dt_ms: u32) {
        for (id, entity) in &mut self.entities {
            entity.update(*id, dt_ms, &self.bounds, &mut self.pending);
        }
    }

    fn detect_collisions(&mut self) {
        self.last_contacts.clear();
        let live: Vec<(EntityId, &Entity)> =
            self.entities.iter().map(|(id, e)| (*id, e)).collect();

        let mut contacts: BTreeMap<EntityId, Vec<Contact>> = BTreeMap::new();
        for (i, (a_id, a)) in live.iter().enumerate() {
            for (b_id, b) in &live[i + 1..] {
                if a.collision_test(b) {
                    trace!(a = %a_id, b = %b_id, "collision");
                    self.last_contacts.push((*a_id, *b_id));
                    contacts
                        .entry(*a_id)
                        .or_default()
                        .push(Contact::new(*b_id, b.tag()));
                    contacts
                        .entry(*b_id)
                        .or_default()
                        .push(Contact::new(*a_id, a.tag()));
                }
            }
        }

        for (id, list) in &contacts {
            if let Some(entity) = self.entities.get(id) {
                entity.on_collision(*id, list, &mut self.pending);
            }
        }
    }

    fn apply_removals(&mut self, failures: &mut Vec<ListenerFailure>) {
        let removals = self.pending.take_removals();
        if removals.is_empty() {
            return;
        }
        debug!(count = removals.len(), "applying removals");

        for id in removals {
            let Some(entity) = self.entities.remove(&id) else {
                continue;
            };
            let mut ctx =
                WorldContext::new(&mut self.entities, &mut self.pending, &mut self.timers, self.tick);
            let errors = self
                .world_listeners
                .notify(|l| l.on_object_removed(&mut ctx, id, &entity));
            record(failures, WorldEvent::ObjectRemoved(id), errors);
        }
    }

    fn apply_additions(&mut self, failures: &mut Vec<ListenerFailure>) {
        let additions = self.pending.take_additions();
        if additions.is_empty() {
            return;
        }
        debug!(count = additions.len(), "applying additions");

        for (id, entity) in additions {
            let added = entity.clone();
            self.entities.insert(id, entity);
            let mut ctx =
                WorldContext::new(&mut self.entities, &mut self.pending, &mut self.timers, self.tick);
            let errors = self
                .world_listeners
                .notify(|l| l.on_object_added(&mut ctx, id, &added));
            record(failures, WorldEvent::ObjectAdded(id), errors);
        }
    }

    fn notify_world_updated(&mut self, failures: &mut Vec<ListenerFailure>) {
        let mut ctx =
            WorldContext::new(&mut self.entities, &mut self.pending, &mut self.timers, self.tick);
        let errors = self
            .world_listeners
            .notify(|l| l.on_world_updated(&mut ctx));
        record(failures, WorldEvent::WorldUpdated, errors);
    }

    fn fire_timers(&mut self, dt_ms: u32, horizon: u64, failures: &mut Vec<ListenerFailure>) {
        for tag in self.timers.advance_scheduled_before(dt_ms, horizon) {
            debug!(%tag, "timer fired");
            let mut ctx =
                WorldContext::new(&mut self.entities, &mut self.pending, &mut self.timers, self.tick);
            let errors = self.timer_listeners.notify(|l| l.on_timer(&mut ctx, tag));
            record(failures, WorldEvent::Timer(tag), errors);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldBounds::default())
    }
}

impl Commands for World {
    fn add_object(&mut self, entity: Entity) -> EntityId {
        Self::add_object(self, entity)
    }

    fn flag_for_removal(&mut self, id: EntityId) -> bool {
        Self::flag_for_removal(self, id)
    }

    fn schedule(&mut self, duration_ms: u32, tag: TimerTag) {
        Self::schedule(self, duration_ms, tag);
    }

    fn cancel_timer(&mut self, tag: TimerTag) -> usize {
        Self::cancel_timer(self, tag)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.get(id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.get_mut(id)
    }
}

fn record(failures: &mut Vec<ListenerFailure>, event: WorldEvent, errors: Vec<ListenerError>) {
    for error in errors {
        warn!(%event, %error, "listener failed");
        failures.push(ListenerFailure { event, error });
    }
}
