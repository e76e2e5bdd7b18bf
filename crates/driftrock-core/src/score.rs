//! Score accounting.

use std::cell::RefCell;
use std::rc::Rc;

use drift::{
    Entity, EntityId, EntityTag, ListenerError, ListenerId, Subscribers, WorldContext,
    WorldListener,
};
use tracing::debug;

/// Observer of score changes.
pub trait ScoreListener {
    /// The score is now `score`.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure to the world.
    fn on_score_changed(&mut self, score: u64) -> Result<(), ListenerError>;
}

/// Awards points for every asteroid that leaves the world.
#[derive(Debug)]
pub struct ScoreKeeper {
    score: u64,
    points_per_asteroid: u64,
    listeners: Subscribers<dyn ScoreListener>,
}

impl ScoreKeeper {
    /// Creates a keeper at zero.
    #[must_use]
    pub fn new(points_per_asteroid: u64) -> Self {
        Self {
            score: 0,
            points_per_asteroid,
            listeners: Subscribers::new(),
        }
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Back to zero, without notifying anyone.
    pub fn reset(&mut self) {
        self.score = 0;
    }

    /// Subscribes a score listener.
    pub fn add_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: ScoreListener + 'static,
    {
        let shared: Rc<RefCell<dyn ScoreListener>> = listener.clone();
        self.listeners.subscribe(Rc::downgrade(&shared))
    }

    /// Unsubscribes a score listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl WorldListener for ScoreKeeper {
    fn on_object_removed(
        &mut self,
        _ctx: &mut WorldContext<'_>,
        _id: EntityId,
        entity: &Entity,
    ) -> Result<(), ListenerError> {
        if entity.tag() != EntityTag::Asteroid {
            return Ok(());
        }
        self.score = self.score.saturating_add(self.points_per_asteroid);
        debug!(score = self.score, "score changed");
        let score = self.score;
        ListenerError::merge(self.listeners.notify(|l| l.on_score_changed(score)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift::{Kinematics, World};

    #[derive(Default)]
    struct Seen(Vec<u64>);

    impl ScoreListener for Seen {
        fn on_score_changed(&mut self, score: u64) -> Result<(), ListenerError> {
            self.0.push(score);
            Ok(())
        }
    }

    fn world_with_keeper() -> (World, Rc<RefCell<ScoreKeeper>>, Rc<RefCell<Seen>>) {
        let mut world = World::default();
        let keeper = Rc::new(RefCell::new(ScoreKeeper::new(10)));
        let seen = Rc::new(RefCell::new(Seen::default()));
        keeper.borrow_mut().add_listener(&seen);
        world.add_listener(&keeper);
        (world, keeper, seen)
    }

    #[test]
    fn asteroid_removal_scores() {
        let (mut world, keeper, seen) = world_with_keeper();
        let a = world.add_object(Entity::asteroid(Kinematics::default()));
        let b = world.add_object(Entity::asteroid(Kinematics::default()));
        world.update(0).unwrap();

        world.flag_for_removal(a);
        world.flag_for_removal(b);
        world.update(0).unwrap();

        assert_eq!(keeper.borrow().score(), 20);
        assert_eq!(seen.borrow().0, vec![10, 20]);
    }

    #[test]
    fn other_kinds_do_not_score() {
        let (mut world, keeper, seen) = world_with_keeper();
        let ship = world.add_object(Entity::spaceship());
        let bullet = world.add_object(Entity::bullet(Kinematics::default(), 1000));
        world.update(0).unwrap();

        world.flag_for_removal(ship);
        world.flag_for_removal(bullet);
        world.update(0).unwrap();

        assert_eq!(keeper.borrow().score(), 0);
        assert!(seen.borrow().0.is_empty());
    }

    #[test]
    fn reset_is_silent() {
        let (mut world, keeper, seen) = world_with_keeper();
        let a = world.add_object(Entity::asteroid(Kinematics::default()));
        world.update(0).unwrap();
        world.flag_for_removal(a);
        world.update(0).unwrap();

        keeper.borrow_mut().reset();

        assert_eq!(keeper.borrow().score(), 0);
        assert_eq!(seen.borrow().0, vec![10]);
    }
}
