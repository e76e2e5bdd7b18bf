//! The composition root: one world, its rule listeners and a high-score store.
//!
//! Listeners live in `Rc<RefCell<_>>` handles owned here; the world and the
//! listeners' own notifiers only hold weak handles, so dropping the session
//! (or calling [`AsteroidsSession::shutdown`]) tears everything down.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use drift::{Entity, ListenerError, ListenerId, World, WorldError};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, GameConfig};
use crate::hud::Hud;
use crate::persistence::{HighScoreStore, PersistenceError};
use crate::phase::{GamePhase, PhaseController};
use crate::player::Player;
use crate::score::ScoreKeeper;

/// Errors surfaced by a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A world update reported listener failures.
    #[error(transparent)]
    World(#[from] WorldError),

    /// A listener failed outside a world update.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// The high score could not be written.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Subscription handles needed for teardown.
#[derive(Debug, Default)]
struct Wiring {
    phase_world: Option<ListenerId>,
    phase_timer: Option<ListenerId>,
    score_world: Option<ListenerId>,
    player_world: Option<ListenerId>,
    hud_on_score: Option<ListenerId>,
    hud_on_player: Option<ListenerId>,
    phase_on_player: Option<ListenerId>,
    hud_on_phase: Option<ListenerId>,
}

/// A complete game: arena, rules, display model and high score.
#[derive(Debug)]
pub struct AsteroidsSession<S: HighScoreStore> {
    config: GameConfig,
    world: World,
    phase: Rc<RefCell<PhaseController>>,
    score: Rc<RefCell<ScoreKeeper>>,
    player: Rc<RefCell<Player>>,
    hud: Rc<RefCell<Hud>>,
    store: S,
    high_score: u64,
    persisted: bool,
    game_over_handled: bool,
    wiring: Wiring,
}

impl<S: HighScoreStore> AsteroidsSession<S> {
    /// Builds and wires a session. Nothing is spawned until [`start`](Self::start).
    ///
    /// A high score that cannot be loaded is logged and treated as 0.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if `config` fails validation.
    pub fn new(config: GameConfig, mut store: S) -> Result<Self, SessionError> {
        config.validate()?;

        let high_score = store.load().unwrap_or_else(|err| {
            warn!(error = %err, "could not load high score, starting from 0");
            0
        });

        let mut session = Self {
            world: World::new(config.bounds()),
            phase: Rc::new(RefCell::new(PhaseController::new(&config))),
            score: Rc::new(RefCell::new(ScoreKeeper::new(config.points_per_asteroid))),
            player: Rc::new(RefCell::new(Player::new(config.lives))),
            hud: Rc::new(RefCell::new(Hud::new(config.lives, high_score))),
            config,
            store,
            high_score,
            persisted: false,
            game_over_handled: false,
            wiring: Wiring::default(),
        };
        session.wire();
        Ok(session)
    }

    fn wire(&mut self) {
        let w = &mut self.wiring;
        w.phase_world = Some(self.world.add_listener(&self.phase));
        w.phase_timer = Some(self.world.add_timer_listener(&self.phase));
        w.hud_on_score = Some(self.score.borrow_mut().add_listener(&self.hud));
        w.phase_on_player = Some(self.player.borrow_mut().add_listener(&self.phase));
        w.hud_on_player = Some(self.player.borrow_mut().add_listener(&self.hud));
        w.hud_on_phase = Some(self.phase.borrow_mut().add_listener(&self.hud));
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Populates the arena for attract mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Listener`] if a phase listener fails.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.phase.borrow_mut().start(&mut self.world)?;
        Ok(())
    }

    /// Asks to leave attract mode. Returns false if the request was ignored.
    pub fn request_start(&mut self) -> bool {
        self.phase.borrow_mut().request_start(&mut self.world)
    }

    /// Advances the game by `dt_ms` milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::World`] if listeners failed during the update,
    /// or [`SessionError::Persistence`] if saving the high score at game over
    /// failed. When both happen the world error wins and the save failure is
    /// logged; [`shutdown`](Self::shutdown) retries an unsaved high score. The
    /// update itself always completes.
    pub fn update(&mut self, dt_ms: u32) -> Result<(), SessionError> {
        let result = self.world.update(dt_ms);
        self.sync_subscriptions();
        let saved = if self.phase() == GamePhase::GameOver && !self.game_over_handled {
            self.game_over_handled = true;
            self.persist()
        } else {
            Ok(())
        };
        match (result, saved) {
            (Err(world), Err(save)) => {
                warn!(error = %save, "high score save failed at game over");
                Err(world.into())
            }
            (Err(world), Ok(())) => Err(world.into()),
            (Ok(()), Err(save)) => Err(save.into()),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Clears the arena and every counter and goes back to attract mode.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Listener`] if a phase listener fails.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        info!("restarting session");
        self.world.clear();
        self.unsubscribe_counters();
        self.score.borrow_mut().reset();
        self.player.borrow_mut().reset();
        self.hud.borrow_mut().reset(self.config.lives, self.high_score);
        self.persisted = false;
        self.game_over_handled = false;
        self.phase.borrow_mut().restart(&mut self.world)?;
        Ok(())
    }

    /// Unsubscribes every listener and saves the high score.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Persistence`] if the save failed.
    pub fn shutdown(mut self) -> Result<S, SessionError> {
        let w = &mut self.wiring;
        if let Some(id) = w.phase_world.take() {
            self.world.remove_listener(id);
        }
        if let Some(id) = w.phase_timer.take() {
            self.world.remove_timer_listener(id);
        }
        if let Some(id) = w.hud_on_score.take() {
            self.score.borrow_mut().remove_listener(id);
        }
        if let Some(id) = w.phase_on_player.take() {
            self.player.borrow_mut().remove_listener(id);
        }
        if let Some(id) = w.hud_on_player.take() {
            self.player.borrow_mut().remove_listener(id);
        }
        if let Some(id) = w.hud_on_phase.take() {
            self.phase.borrow_mut().remove_listener(id);
        }
        self.unsubscribe_counters();
        if !self.persisted {
            self.persist()?;
        }
        info!(high_score = self.high_score, "session shut down");
        Ok(self.store)
    }

    /// Subscribes the score keeper and lives tracker once a game is under way.
    fn sync_subscriptions(&mut self) {
        if !self.phase().is_playing() {
            return;
        }
        if self.wiring.score_world.is_none() {
            self.wiring.score_world = Some(self.world.add_listener(&self.score));
        }
        if self.wiring.player_world.is_none() {
            self.wiring.player_world = Some(self.world.add_listener(&self.player));
        }
    }

    fn unsubscribe_counters(&mut self) {
        if let Some(id) = self.wiring.score_world.take() {
            self.world.remove_listener(id);
        }
        if let Some(id) = self.wiring.player_world.take() {
            self.world.remove_listener(id);
        }
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let score = self.score();
        if score > self.high_score {
            self.store.save(score)?;
            self.high_score = score;
            self.hud.borrow_mut().set_high_score(score);
        }
        self.persisted = true;
        Ok(())
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Engages or releases the ship's engine. Ignored outside play.
    pub fn thrust(&mut self, engaged: bool) -> bool {
        let thrust = if engaged { self.config.ship_thrust } else { 0.0 };
        self.with_ship(|ship| ship.thrust(thrust))
    }

    /// Turns the ship; `direction` is clamped to `[-1, 1]` and scaled by the
    /// configured rotation rate. Ignored outside play.
    pub fn rotate(&mut self, direction: f32) -> bool {
        let rotation = direction.clamp(-1.0, 1.0) * self.config.ship_rotation;
        self.with_ship(|ship| ship.rotate(rotation))
    }

    /// Fires a bullet from the ship. Ignored outside play or while the ship
    /// is not yet live.
    pub fn shoot(&mut self) -> bool {
        if !self.phase().is_playing() {
            return false;
        }
        let Some(id) = self.phase.borrow().ship() else {
            return false;
        };
        let spec = self.config.bullet_spec();
        match self.world.get(id).and_then(|ship| ship.fire(&spec)) {
            Some(bullet) => {
                self.world.add_object(bullet);
                true
            }
            None => false,
        }
    }

    fn with_ship(&mut self, f: impl FnOnce(&mut Entity)) -> bool {
        if !self.phase().is_playing() {
            return false;
        }
        let Some(id) = self.phase.borrow().ship() else {
            return false;
        };
        match self.world.get_mut(id) {
            Some(ship) => {
                f(ship);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The arena, for rendering.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Direct arena access for tools. Bypasses the input gating of
    /// [`thrust`](Self::thrust), [`rotate`](Self::rotate) and [`shoot`](Self::shoot).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase.borrow().phase()
    }

    /// Current level.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.phase.borrow().level()
    }

    /// Current score.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.score.borrow().score()
    }

    /// Lives left.
    #[must_use]
    pub fn lives(&self) -> u32 {
        self.player.borrow().lives()
    }

    /// Best score known to this session.
    #[must_use]
    pub const fn high_score(&self) -> u64 {
        self.high_score
    }

    /// The label model.
    ///
    /// # Panics
    ///
    /// Panics if called from inside a listener callback, which cannot happen
    /// through this type's public API.
    #[must_use]
    pub fn hud(&self) -> Ref<'_, Hud> {
        self.hud.borrow()
    }

    /// The high-score store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }
}
