//! Deferred mutation of the live set.
//!
//! Nothing adds to or removes from the live set while an update or collision
//! pass is iterating it. Requests are recorded here and applied by the world
//! in its apply phase, removals first, each in request order.

use std::collections::HashSet;

use crate::entity::{Entity, EntityId};

/// Pending additions and removals, plus the id allocator.
#[derive(Debug, Default)]
pub struct MutationQueue {
    next_id: u64,
    additions: Vec<(EntityId, Entity)>,
    removals: Vec<EntityId>,
    flagged: HashSet<EntityId>,
}

impl MutationQueue {
    /// Creates an empty queue whose first allocated id is 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `entity` for addition and returns the id it will live under.
    pub fn add_object(&mut self, entity: Entity) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.additions.push((id, entity));
        id
    }

    /// Queues `id` for removal.
    ///
    /// Returns false if it was already flagged since the last apply phase.
    pub fn flag_for_removal(&mut self, id: EntityId) -> bool {
        if self.flagged.insert(id) {
            self.removals.push(id);
            true
        } else {
            false
        }
    }

    /// Returns true if `id` is waiting to be removed.
    #[must_use]
    pub fn is_flagged(&self, id: EntityId) -> bool {
        self.flagged.contains(&id)
    }

    /// Returns true if `id` is waiting to be added.
    #[must_use]
    pub fn is_pending_addition(&self, id: EntityId) -> bool {
        self.additions.iter().any(|(pending, _)| *pending == id)
    }

    /// Looks up an entity that is queued but not yet live.
    #[must_use]
    pub fn pending(&self, id: EntityId) -> Option<&Entity> {
        self.additions
            .iter()
            .find(|(pending, _)| *pending == id)
            .map(|(_, entity)| entity)
    }

    /// Number of queued additions.
    #[must_use]
    pub fn pending_additions(&self) -> usize {
        self.additions.len()
    }

    /// Number of queued removals.
    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.removals.len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Drains queued additions in request order.
    pub fn take_additions(&mut self) -> Vec<(EntityId, Entity)> {
        std::mem::take(&mut self.additions)
    }

    /// Drains queued removals in request order and forgets their flags.
    pub fn take_removals(&mut self) -> Vec<EntityId> {
        self.flagged.clear();
        std::mem::take(&mut self.removals)
    }

    /// Drops every pending request. Allocated ids are not reused.
    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
        self.flagged.clear();
    }
}
