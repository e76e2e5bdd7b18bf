//! Test helper functions for setting up sessions.
//!
//! Sessions here use a [`MemoryStore`] and a configuration with frozen
//! asteroids, so outcomes depend only on what a test does.

use drift::{EntityId, EntityTag, World};

use crate::config::{GameConfig, PhaseTimings};
use crate::persistence::MemoryStore;
use crate::phase::GamePhase;
use crate::session::AsteroidsSession;

/// A session over a [`MemoryStore`].
pub type TestSession = AsteroidsSession<MemoryStore>;

// =============================================================================
// Setup
// =============================================================================

/// Routes `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Three motionless asteroids and a demo pilot that stays idle for a minute.
#[must_use]
pub fn quiet_config() -> GameConfig {
    GameConfig {
        initial_asteroids: 3,
        asteroid_speed: 0.0,
        asteroid_max_rotation: 0.0,
        timings: PhaseTimings {
            demo_first_ms: 60_000,
            demo_interval_ms: 60_000,
            ..PhaseTimings::default()
        },
        ..GameConfig::default()
    }
}

/// A started session in attract mode.
///
/// # Panics
///
/// Panics if the session cannot be built or started.
#[must_use]
pub fn attract_session(config: GameConfig, high_score: u64) -> TestSession {
    init_tracing();
    let mut session =
        AsteroidsSession::new(config, MemoryStore::with_high_score(high_score)).unwrap();
    session.start().unwrap();
    session.update(0).unwrap();
    session
}

/// A session in [`GamePhase::Active`] with a live ship.
///
/// # Panics
///
/// Panics if the session does not reach play.
#[must_use]
pub fn playing_session(config: GameConfig) -> TestSession {
    let start_ms = config.timings.start_game_ms;
    let mut session = attract_session(config, 0);
    assert!(session.request_start());
    session.update(start_ms).unwrap();
    // CreateNewPlayer was scheduled with no delay; the next step fires it.
    session.update(1).unwrap();
    assert_eq!(session.phase(), GamePhase::Active);
    session
}

// =============================================================================
// Queries
// =============================================================================

/// Ids of every live entity of `tag`, in id order.
#[must_use]
pub fn ids_of(world: &World, tag: EntityTag) -> Vec<EntityId> {
    let mut ids: Vec<_> = world
        .iter()
        .filter(|(_, e)| e.tag() == tag)
        .map(|(id, _)| id)
        .collect();
    ids.sort();
    ids
}
