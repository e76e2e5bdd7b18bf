//! # Driftrock Core
//!
//! Asteroids game rules on top of the [`drift`] world.
//!
//! Every rule is a listener on the world:
//!
//! - **Phases**: attract mode, play, level transitions and game over, driven
//!   by timers ([`PhaseController`])
//! - **Score**: points per destroyed asteroid ([`ScoreKeeper`])
//! - **Lives**: one life per destroyed ship ([`Player`])
//! - **Display**: the label model a GUI renders ([`Hud`])
//!
//! [`AsteroidsSession`] wires them together with a [`HighScoreStore`].
//!
//! ## Usage
//!
//! ```
//! use driftrock_core::{AsteroidsSession, GameConfig, GamePhase, MemoryStore};
//!
//! let mut session = AsteroidsSession::new(GameConfig::default(), MemoryStore::default())?;
//! session.start()?;
//! assert_eq!(session.phase(), GamePhase::AttractMode);
//!
//! session.request_start();
//! session.update(100)?;
//! assert_eq!(session.phase(), GamePhase::Active);
//! # Ok::<(), driftrock_core::SessionError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use drift;

pub mod config;
pub mod hud;
pub mod persistence;
pub mod phase;
pub mod player;
pub mod score;
pub mod session;
pub mod spawn;

pub use config::{ConfigError, GameConfig, PhaseTimings};
pub use hud::{Hud, HudLabel, Label};
pub use persistence::{HighScoreStore, JsonFileStore, MemoryStore, PersistenceError};
pub use phase::{GamePhase, GameTimer, PhaseController, PhaseListener};
pub use player::{Player, PlayerListener};
pub use score::{ScoreKeeper, ScoreListener};
pub use session::{AsteroidsSession, SessionError};
pub use spawn::{DemoAction, EntityFactory};

#[cfg(test)]
mod tests;
