//! Errors reported by [`World::update`](crate::world::World::update).

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::listener::ListenerError;
use crate::timer::TimerTag;

/// The dispatch during which a listener failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// "object added" for the given entity.
    ObjectAdded(EntityId),
    /// "object removed" for the given entity.
    ObjectRemoved(EntityId),
    /// "tick completed".
    WorldUpdated,
    /// A fired timer.
    Timer(TimerTag),
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ObjectAdded(id) => write!(f, "object added ({id})"),
            Self::ObjectRemoved(id) => write!(f, "object removed ({id})"),
            Self::WorldUpdated => write!(f, "world updated"),
            Self::Timer(tag) => write!(f, "timer ({tag})"),
        }
    }
}

/// One listener error together with the event being dispatched.
#[derive(Debug, Error)]
#[error("{event}: {error}")]
pub struct ListenerFailure {
    /// Event being dispatched.
    pub event: WorldEvent,
    /// What the listener returned.
    #[source]
    pub error: ListenerError,
}

/// Errors from a world tick.
#[derive(Debug, Error)]
pub enum WorldError {
    /// One or more listeners failed. The tick itself ran to completion.
    #[error("{} listener failure(s) during tick {tick}", .failures.len())]
    Listener {
        /// Tick index.
        tick: u64,
        /// Every failure in dispatch order.
        failures: Vec<ListenerFailure>,
    },
}

impl WorldError {
    /// The collected listener failures.
    #[must_use]
    pub fn failures(&self) -> &[ListenerFailure] {
        match self {
            Self::Listener { failures, .. } => failures,
        }
    }
}
