//! Listener traits and subscription lists.
//!
//! Listeners are owned by whoever composes the game (`Rc<RefCell<_>>`); the
//! world and other notifiers only keep [`Weak`] handles in a [`Subscribers`]
//! list. A listener that has been dropped is pruned the next time its list is
//! notified.
//!
//! Callbacks never see the [`World`](crate::world::World) itself. They get a
//! [`WorldContext`] whose mutating operations go through the deferred queues,
//! so nothing a listener does can change the live set mid-dispatch.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::rc::{Rc, Weak};

use thiserror::Error;

use crate::entity::{Entity, EntityId, EntityTag};
use crate::queue::MutationQueue;
use crate::timer::{TimerQueue, TimerTag};

// =============================================================================
// Listener Error
// =============================================================================

/// Error returned by a listener callback.
///
/// A failing listener does not stop the dispatch; the world collects the error
/// and reports it once the tick is complete.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ListenerError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Folds the errors of a nested fan-out into one result.
    ///
    /// A single error is returned unchanged; several are joined into one
    /// message.
    ///
    /// # Errors
    ///
    /// Returns an error if `errors` is not empty.
    pub fn merge(mut errors: Vec<Self>) -> Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Self::new(joined))
            }
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Deferred world mutations available both to the driver (through the world)
/// and to listener callbacks (through a [`WorldContext`]).
pub trait Commands {
    /// Queues an entity for addition and returns its future id.
    fn add_object(&mut self, entity: Entity) -> EntityId;

    /// Queues a live entity for removal. Returns false for unknown, stale or
    /// already flagged ids.
    fn flag_for_removal(&mut self, id: EntityId) -> bool;

    /// Schedules a one-shot timer.
    fn schedule(&mut self, duration_ms: u32, tag: TimerTag);

    /// Cancels every pending timer with `tag`.
    fn cancel_timer(&mut self, tag: TimerTag) -> usize;

    /// Looks up a live entity.
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Looks up a live entity for an action (thrust, rotate, reset).
    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity>;
}

/// View of the world handed to listener callbacks.
///
/// Live entities can be read and acted upon in place; additions, removals and
/// timers are queued.
pub struct WorldContext<'a> {
    entities: &'a mut BTreeMap<EntityId, Entity>,
    queue: &'a mut MutationQueue,
    timers: &'a mut TimerQueue,
    tick: u64,
}

impl<'a> WorldContext<'a> {
    pub(crate) fn new(
        entities: &'a mut BTreeMap<EntityId, Entity>,
        queue: &'a mut MutationQueue,
        timers: &'a mut TimerQueue,
        tick: u64,
    ) -> Self {
        Self {
            entities,
            queue,
            timers,
            tick,
        }
    }

    /// Index of the tick being dispatched.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns true if `id` is in the live set.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns true if `id` is waiting to be removed.
    #[must_use]
    pub fn is_flagged(&self, id: EntityId) -> bool {
        self.queue.is_flagged(id)
    }

    /// Iterates live entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Number of live entities of the given kind.
    #[must_use]
    pub fn count_of(&self, tag: EntityTag) -> usize {
        self.entities.values().filter(|e| e.tag() == tag).count()
    }

    /// Pending timers.
    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        self.timers
    }
}

impl Commands for WorldContext<'_> {
    fn add_object(&mut self, entity: Entity) -> EntityId {
        self.queue.add_object(entity)
    }

    fn flag_for_removal(&mut self, id: EntityId) -> bool {
        self.entities.contains_key(&id) && self.queue.flag_for_removal(id)
    }

    fn schedule(&mut self, duration_ms: u32, tag: TimerTag) {
        self.timers.schedule(duration_ms, tag);
    }

    fn cancel_timer(&mut self, tag: TimerTag) -> usize {
        self.timers.cancel(tag)
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }
}

impl fmt::Debug for WorldContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldContext")
            .field("tick", &self.tick)
            .field("live", &self.entities.len())
            .field("pending_additions", &self.queue.pending_additions())
            .field("pending_removals", &self.queue.pending_removals())
            .field("timers", &self.timers.len())
            .finish()
    }
}

// =============================================================================
// Listener Traits
// =============================================================================

/// Observer of live-set changes and tick completion.
///
/// Every method defaults to doing nothing, so a listener only implements the
/// events it cares about.
pub trait WorldListener {
    /// An entity joined the live set.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure without stopping the tick.
    fn on_object_added(
        &mut self,
        _ctx: &mut WorldContext<'_>,
        _id: EntityId,
        _entity: &Entity,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// An entity left the live set. `entity` is its final state.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure without stopping the tick.
    fn on_object_removed(
        &mut self,
        _ctx: &mut WorldContext<'_>,
        _id: EntityId,
        _entity: &Entity,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The update and apply phases of a tick are done.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure without stopping the tick.
    fn on_world_updated(&mut self, _ctx: &mut WorldContext<'_>) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Observer of fired timers. Every subscriber sees every tag.
pub trait TimerListener {
    /// A timer fired.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure without stopping the tick.
    fn on_timer(&mut self, ctx: &mut WorldContext<'_>, tag: TimerTag) -> Result<(), ListenerError>;
}

// =============================================================================
// Subscribers
// =============================================================================

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

/// Ordered list of weakly held listeners.
///
/// Notification follows subscription order.
pub struct Subscribers<T: ?Sized> {
    entries: Vec<(ListenerId, Weak<RefCell<T>>)>,
    next_id: u64,
}

impl<T: ?Sized> Subscribers<T> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Adds a listener at the end of the notification order.
    pub fn subscribe(&mut self, listener: Weak<RefCell<T>>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    /// Returns true if `id` is still subscribed and alive.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries
            .iter()
            .any(|(entry, weak)| *entry == id && weak.strong_count() > 0)
    }

    /// Number of subscribers that are still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Returns true if no live subscriber remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every subscriber.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Prunes dropped listeners and returns strong handles to the rest, in
    /// subscription order.
    pub fn snapshot(&mut self) -> Vec<Rc<RefCell<T>>> {
        self.entries.retain(|(_, weak)| weak.strong_count() > 0);
        self.entries
            .iter()
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    /// Calls `f` on every live listener and collects the errors.
    ///
    /// A listener that is already mutably borrowed (re-entrant dispatch) is
    /// skipped and reported as an error.
    pub fn notify<F>(&mut self, mut f: F) -> Vec<ListenerError>
    where
        F: FnMut(&mut T) -> Result<(), ListenerError>,
    {
        let mut errors = Vec::new();
        for listener in self.snapshot() {
            let result = match listener.try_borrow_mut() {
                Ok(mut guard) => f(&mut guard),
                Err(err) => Err(ListenerError::with_source(
                    "listener is already borrowed",
                    err.to_string(),
                )),
            };
            if let Err(err) = result {
                errors.push(err);
            }
        }
        errors
    }
}

impl<T: ?Sized> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("ids", &self.entries.iter().map(|(id, _)| *id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Counter {
        fn bump(&mut self) -> Result<(), ListenerError>;
    }

    #[derive(Default)]
    struct Count(u32);

    impl Counter for Count {
        fn bump(&mut self) -> Result<(), ListenerError> {
            self.0 += 1;
            Ok(())
        }
    }

    struct Failing;

    impl Counter for Failing {
        fn bump(&mut self) -> Result<(), ListenerError> {
            Err(ListenerError::new("boom"))
        }
    }

    fn weak<L: Counter + 'static>(listener: &Rc<RefCell<L>>) -> Weak<RefCell<dyn Counter>> {
        let shared: Rc<RefCell<dyn Counter>> = listener.clone();
        Rc::downgrade(&shared)
    }

    mod subscribers_tests {
        use super::*;

        #[test]
        fn notifies_every_live_listener() {
            let a = Rc::new(RefCell::new(Count::default()));
            let b = Rc::new(RefCell::new(Count::default()));
            let mut subs: Subscribers<dyn Counter> = Subscribers::new();
            subs.subscribe(weak(&a));
            subs.subscribe(weak(&b));

            let errors = subs.notify(|c| c.bump());

            assert!(errors.is_empty());
            assert_eq!(a.borrow().0, 1);
            assert_eq!(b.borrow().0, 1);
        }

        #[test]
        fn dropped_listeners_are_pruned() {
            let a = Rc::new(RefCell::new(Count::default()));
            let mut subs: Subscribers<dyn Counter> = Subscribers::new();
            {
                let b = Rc::new(RefCell::new(Count::default()));
                subs.subscribe(weak(&a));
                subs.subscribe(weak(&b));
                assert_eq!(subs.len(), 2);
            }
            assert_eq!(subs.len(), 1);
            assert_eq!(subs.snapshot().len(), 1);
        }

        #[test]
        fn unsubscribe_is_idempotent() {
            let a = Rc::new(RefCell::new(Count::default()));
            let mut subs: Subscribers<dyn Counter> = Subscribers::new();
            let id = subs.subscribe(weak(&a));

            assert!(subs.unsubscribe(id));
            assert!(!subs.unsubscribe(id));
            assert!(subs.is_empty());
            subs.notify(|c| c.bump());
            assert_eq!(a.borrow().0, 0);
        }

        #[test]
        fn failure_does_not_stop_fan_out() {
            let failing = Rc::new(RefCell::new(Failing));
            let counting = Rc::new(RefCell::new(Count::default()));
            let mut subs: Subscribers<dyn Counter> = Subscribers::new();
            subs.subscribe(weak(&failing));
            subs.subscribe(weak(&counting));

            let errors = subs.notify(|c| c.bump());

            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].message(), "boom");
            assert_eq!(counting.borrow().0, 1);
        }

        #[test]
        fn borrowed_listener_is_reported() {
            let a = Rc::new(RefCell::new(Count::default()));
            let mut subs: Subscribers<dyn Counter> = Subscribers::new();
            subs.subscribe(weak(&a));

            let _held = a.borrow_mut();
            let errors = subs.notify(|c| c.bump());

            assert_eq!(errors.len(), 1);
            assert!(errors[0].source().is_some());
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn merge_empty_is_ok() {
            assert!(ListenerError::merge(Vec::new()).is_ok());
        }

        #[test]
        fn merge_single_keeps_error() {
            let err = ListenerError::merge(vec![ListenerError::new("one")]).unwrap_err();
            assert_eq!(err.message(), "one");
        }

        #[test]
        fn merge_many_joins_messages() {
            let err = ListenerError::merge(vec![
                ListenerError::new("one"),
                ListenerError::new("two"),
            ])
            .unwrap_err();
            assert_eq!(err.to_string(), "one; two");
        }
    }
}
