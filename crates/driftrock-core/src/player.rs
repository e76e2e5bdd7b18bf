//! Player lives.

use std::cell::RefCell;
use std::rc::Rc;

use drift::{
    Entity, EntityId, EntityTag, ListenerError, ListenerId, Subscribers, WorldContext,
    WorldListener,
};
use tracing::debug;

/// Observer of ship losses.
pub trait PlayerListener {
    /// The player's ship was destroyed and `lives_left` remain.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure to the world.
    fn on_player_killed(
        &mut self,
        ctx: &mut WorldContext<'_>,
        lives_left: u32,
    ) -> Result<(), ListenerError>;
}

/// Counts lives down as spaceships leave the world.
#[derive(Debug)]
pub struct Player {
    lives: u32,
    starting_lives: u32,
    listeners: Subscribers<dyn PlayerListener>,
}

impl Player {
    /// A player with `lives` lives.
    #[must_use]
    pub fn new(lives: u32) -> Self {
        Self {
            lives,
            starting_lives: lives,
            listeners: Subscribers::new(),
        }
    }

    /// Lives left.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Back to the starting lives, without notifying anyone.
    pub fn reset(&mut self) {
        self.lives = self.starting_lives;
    }

    /// Subscribes a player listener.
    pub fn add_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: PlayerListener + 'static,
    {
        let shared: Rc<RefCell<dyn PlayerListener>> = listener.clone();
        self.listeners.subscribe(Rc::downgrade(&shared))
    }

    /// Unsubscribes a player listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

impl WorldListener for Player {
    fn on_object_removed(
        &mut self,
        ctx: &mut WorldContext<'_>,
        _id: EntityId,
        entity: &Entity,
    ) -> Result<(), ListenerError> {
        if entity.tag() != EntityTag::Spaceship {
            return Ok(());
        }
        self.lives = self.lives.saturating_sub(1);
        debug!(lives = self.lives, "player killed");
        let lives = self.lives;
        ListenerError::merge(self.listeners.notify(|l| l.on_player_killed(ctx, lives)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift::{Commands, Kinematics, TimerTag, World};

    /// Schedules a timer tagged with the lives left.
    struct Echo;

    impl PlayerListener for Echo {
        fn on_player_killed(
            &mut self,
            ctx: &mut WorldContext<'_>,
            lives_left: u32,
        ) -> Result<(), ListenerError> {
            ctx.schedule(100, TimerTag::new(lives_left));
            Ok(())
        }
    }

    #[test]
    fn ship_loss_costs_a_life() {
        let mut world = World::default();
        let player = Rc::new(RefCell::new(Player::new(3)));
        let echo = Rc::new(RefCell::new(Echo));
        player.borrow_mut().add_listener(&echo);
        world.add_listener(&player);

        let ship = world.add_object(Entity::spaceship());
        let rock = world.add_object(Entity::asteroid(Kinematics::default()));
        world.update(0).unwrap();
        world.flag_for_removal(ship);
        world.flag_for_removal(rock);
        world.update(0).unwrap();

        assert_eq!(player.borrow().lives(), 2);
        assert!(world.timers().contains(TimerTag::new(2)));
        assert_eq!(world.timers().len(), 1);
    }

    #[test]
    fn lives_never_underflow() {
        let mut world = World::default();
        let player = Rc::new(RefCell::new(Player::new(1)));
        world.add_listener(&player);

        for _ in 0..3 {
            let ship = world.add_object(Entity::spaceship());
            world.update(0).unwrap();
            world.flag_for_removal(ship);
            world.update(0).unwrap();
        }

        assert_eq!(player.borrow().lives(), 0);
        player.borrow_mut().reset();
        assert_eq!(player.borrow().lives(), 1);
    }
}
