//! Game phase state machine.
//!
//! ```text
//! AttractMode ──StartGame──▶ Active ◀──StartNextLevel── LevelTransition
//!                              │  └──────last asteroid──────▶ ▲
//!                              └──ShowGameOver──▶ GameOver
//! ```
//!
//! The controller never polls. It reacts to world "object removed" events
//! (filtered by kind), to the player-killed events of [`Player`](crate::player::Player)
//! and to the timers it schedules itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use drift::{
    Commands, Entity, EntityId, EntityTag, ListenerError, ListenerId, Subscribers, TimerListener,
    TimerTag, WorldContext, WorldListener,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::player::PlayerListener;
use crate::spawn::EntityFactory;

// =============================================================================
// Phases and timers
// =============================================================================

/// Phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen with a demo pilot.
    AttractMode,
    /// The player is in control.
    Active,
    /// Field cleared, next wave pending.
    LevelTransition,
    /// Out of lives. Terminal until a restart.
    GameOver,
}

impl GamePhase {
    /// Returns true while the player controls the ship.
    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Active | Self::LevelTransition)
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttractMode => write!(f, "AttractMode"),
            Self::Active => write!(f, "Active"),
            Self::LevelTransition => write!(f, "LevelTransition"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}

/// Timers scheduled by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GameTimer {
    /// Next demo pilot action.
    DemoMode = 1,
    /// Leave attract mode.
    StartGame = 2,
    /// Put a ship back in play.
    CreateNewPlayer = 3,
    /// Spawn the next wave.
    StartNextLevel = 4,
    /// Show the game-over banner.
    ShowGameOver = 5,
}

impl From<GameTimer> for TimerTag {
    fn from(timer: GameTimer) -> Self {
        Self::new(timer as u32)
    }
}

impl TryFrom<TimerTag> for GameTimer {
    type Error = TimerTag;

    fn try_from(tag: TimerTag) -> Result<Self, Self::Error> {
        match tag.as_u32() {
            1 => Ok(Self::DemoMode),
            2 => Ok(Self::StartGame),
            3 => Ok(Self::CreateNewPlayer),
            4 => Ok(Self::StartNextLevel),
            5 => Ok(Self::ShowGameOver),
            _ => Err(tag),
        }
    }
}

/// Observer of phase and level changes.
pub trait PhaseListener {
    /// The phase is now `phase`.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure to the world.
    fn on_phase_changed(&mut self, _phase: GamePhase) -> Result<(), ListenerError> {
        Ok(())
    }

    /// The level is now `level`.
    ///
    /// # Errors
    ///
    /// Returns an error to report a failure to the world.
    fn on_level_changed(&mut self, _level: u32) -> Result<(), ListenerError> {
        Ok(())
    }
}

// =============================================================================
// Phase controller
// =============================================================================

/// Drives the session through its phases.
#[derive(Debug)]
pub struct PhaseController {
    config: GameConfig,
    factory: EntityFactory,
    phase: GamePhase,
    level: u32,
    asteroid_count: u32,
    ship: Option<EntityId>,
    start_requested: bool,
    out_of_lives: bool,
    listeners: Subscribers<dyn PhaseListener>,
}

impl PhaseController {
    /// Creates a controller in attract mode at level 0.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self {
            config: config.clone(),
            factory: EntityFactory::new(config),
            phase: GamePhase::AttractMode,
            level: 0,
            asteroid_count: 0,
            ship: None,
            start_requested: false,
            out_of_lives: false,
            listeners: Subscribers::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Asteroids spawned and not yet removed.
    #[must_use]
    pub const fn asteroid_count(&self) -> u32 {
        self.asteroid_count
    }

    /// The ship, while one is queued or live.
    #[must_use]
    pub const fn ship(&self) -> Option<EntityId> {
        self.ship
    }

    /// Subscribes a phase listener.
    pub fn add_listener<L>(&mut self, listener: &Rc<RefCell<L>>) -> ListenerId
    where
        L: PhaseListener + 'static,
    {
        let shared: Rc<RefCell<dyn PhaseListener>> = listener.clone();
        self.listeners.subscribe(Rc::downgrade(&shared))
    }

    /// Unsubscribes a phase listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Populates the arena for attract mode: a demo ship, the opening wave and
    /// the first demo timer.
    ///
    /// # Errors
    ///
    /// Returns the merged errors of phase listeners.
    pub fn start(&mut self, cmds: &mut impl Commands) -> Result<(), ListenerError> {
        info!("entering attract mode");
        let errors = self.set_phase(GamePhase::AttractMode);
        self.spawn_ship(cmds);
        self.spawn_asteroids(cmds, self.config.asteroids_for_level(0));
        cmds.schedule(self.config.timings.demo_first_ms, GameTimer::DemoMode.into());
        ListenerError::merge(errors)
    }

    /// Asks to leave attract mode.
    ///
    /// Returns false, and does nothing, outside attract mode or if a start is
    /// already pending.
    pub fn request_start(&mut self, cmds: &mut impl Commands) -> bool {
        if self.phase != GamePhase::AttractMode || self.start_requested {
            return false;
        }
        self.start_requested = true;
        cmds.schedule(self.config.timings.start_game_ms, GameTimer::StartGame.into());
        true
    }

    /// Forgets all progress and starts over in attract mode.
    ///
    /// The caller clears the world first; nothing spawned earlier is tracked.
    ///
    /// # Errors
    ///
    /// Returns the merged errors of phase listeners.
    pub fn restart(&mut self, cmds: &mut impl Commands) -> Result<(), ListenerError> {
        self.factory.reset();
        self.level = 0;
        self.asteroid_count = 0;
        self.ship = None;
        self.start_requested = false;
        self.out_of_lives = false;
        let mut errors = self.notify_level();
        if let Err(err) = self.start(cmds) {
            errors.push(err);
        }
        ListenerError::merge(errors)
    }

    fn set_phase(&mut self, phase: GamePhase) -> Vec<ListenerError> {
        if self.phase == phase {
            return Vec::new();
        }
        info!(from = %self.phase, to = %phase, "phase changed");
        self.phase = phase;
        self.listeners.notify(|l| l.on_phase_changed(phase))
    }

    fn notify_level(&mut self) -> Vec<ListenerError> {
        let level = self.level;
        self.listeners.notify(|l| l.on_level_changed(level))
    }

    fn spawn_ship(&mut self, cmds: &mut impl Commands) {
        let id = cmds.add_object(self.factory.spaceship());
        debug!(%id, "ship spawned");
        self.ship = Some(id);
    }

    fn spawn_asteroids(&mut self, cmds: &mut impl Commands, count: u32) {
        for _ in 0..count {
            cmds.add_object(self.factory.asteroid());
        }
        self.asteroid_count = self.asteroid_count.saturating_add(count);
        debug!(count, total = self.asteroid_count, "asteroids spawned");
    }

    fn field_cleared(&mut self, ctx: &mut WorldContext<'_>) -> Vec<ListenerError> {
        match self.phase {
            GamePhase::Active => {
                ctx.schedule(self.config.timings.next_level_ms, GameTimer::StartNextLevel.into());
                self.set_phase(GamePhase::LevelTransition)
            }
            GamePhase::AttractMode => {
                ctx.schedule(self.config.timings.next_level_ms, GameTimer::StartNextLevel.into());
                Vec::new()
            }
            GamePhase::LevelTransition | GamePhase::GameOver => Vec::new(),
        }
    }

    fn demo_step(&mut self, ctx: &mut WorldContext<'_>) {
        if self.phase != GamePhase::AttractMode {
            return;
        }
        if let Some(id) = self.ship {
            let action = self.factory.demo_action();
            let spec = self.config.bullet_spec();
            let bullet = ctx.entity_mut(id).and_then(|ship| {
                ship.thrust(action.thrust);
                ship.rotate(action.rotation);
                ship.fire(&spec)
            });
            if let Some(bullet) = bullet {
                ctx.add_object(bullet);
            }
        }
        ctx.schedule(self.config.timings.demo_interval_ms, GameTimer::DemoMode.into());
    }

    fn begin_play(&mut self, ctx: &mut WorldContext<'_>) -> Vec<ListenerError> {
        self.start_requested = false;
        if self.phase != GamePhase::AttractMode {
            return Vec::new();
        }
        ctx.cancel_timer(GameTimer::DemoMode.into());
        // a pending demo respawn must not reset the player's ship later
        ctx.cancel_timer(GameTimer::CreateNewPlayer.into());
        let mut errors = self.set_phase(GamePhase::Active);
        ctx.schedule(0, GameTimer::CreateNewPlayer.into());
        if self.asteroid_count == 0 {
            if !ctx.timers().contains(GameTimer::StartNextLevel.into()) {
                ctx.schedule(self.config.timings.next_level_ms, GameTimer::StartNextLevel.into());
            }
            errors.extend(self.set_phase(GamePhase::LevelTransition));
        }
        errors
    }

    fn create_player(&mut self, ctx: &mut WorldContext<'_>) {
        if self.out_of_lives || self.phase == GamePhase::GameOver {
            return;
        }
        match self.ship {
            Some(id) => {
                // a queued ship becomes live on its own
                if let Some(ship) = ctx.entity_mut(id) {
                    ship.reset();
                    debug!(%id, "ship reset");
                }
            }
            None => self.spawn_ship(ctx),
        }
    }

    fn next_level(&mut self, ctx: &mut WorldContext<'_>) -> Vec<ListenerError> {
        match self.phase {
            GamePhase::LevelTransition => {
                self.level += 1;
                info!(level = self.level, "level up");
                self.spawn_asteroids(ctx, self.config.asteroids_for_level(self.level));
                let mut errors = self.notify_level();
                errors.extend(self.set_phase(GamePhase::Active));
                errors
            }
            GamePhase::AttractMode if self.asteroid_count == 0 => {
                self.spawn_asteroids(ctx, self.config.asteroids_for_level(0));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}

impl WorldListener for PhaseController {
    fn on_object_removed(
        &mut self,
        ctx: &mut WorldContext<'_>,
        id: EntityId,
        entity: &Entity,
    ) -> Result<(), ListenerError> {
        let mut errors = Vec::new();
        match entity.tag() {
            EntityTag::Asteroid => {
                ctx.add_object(self.factory.explosion_for(entity));
                self.asteroid_count = self.asteroid_count.saturating_sub(1);
                if self.asteroid_count == 0 {
                    errors = self.field_cleared(ctx);
                }
            }
            EntityTag::Spaceship => {
                ctx.add_object(self.factory.explosion_for(entity));
                if self.ship == Some(id) {
                    self.ship = None;
                }
                if self.phase == GamePhase::AttractMode {
                    ctx.schedule(self.config.timings.respawn_ms, GameTimer::CreateNewPlayer.into());
                }
            }
            EntityTag::Bullet | EntityTag::Explosion => {}
        }
        ListenerError::merge(errors)
    }
}

impl TimerListener for PhaseController {
    fn on_timer(&mut self, ctx: &mut WorldContext<'_>, tag: TimerTag) -> Result<(), ListenerError> {
        let Ok(timer) = GameTimer::try_from(tag) else {
            return Ok(());
        };
        debug!(?timer, phase = %self.phase, "phase timer");
        let errors = match timer {
            GameTimer::DemoMode => {
                self.demo_step(ctx);
                Vec::new()
            }
            GameTimer::StartGame => self.begin_play(ctx),
            GameTimer::CreateNewPlayer => {
                self.create_player(ctx);
                Vec::new()
            }
            GameTimer::StartNextLevel => self.next_level(ctx),
            GameTimer::ShowGameOver => self.set_phase(GamePhase::GameOver),
        };
        ListenerError::merge(errors)
    }
}

impl PlayerListener for PhaseController {
    fn on_player_killed(
        &mut self,
        ctx: &mut WorldContext<'_>,
        lives_left: u32,
    ) -> Result<(), ListenerError> {
        if !self.phase.is_playing() {
            return Ok(());
        }
        if lives_left > 0 {
            ctx.schedule(self.config.timings.respawn_ms, GameTimer::CreateNewPlayer.into());
        } else {
            info!("out of lives");
            self.out_of_lives = true;
            ctx.schedule(self.config.timings.game_over_ms, GameTimer::ShowGameOver.into());
        }
        Ok(())
    }
}
