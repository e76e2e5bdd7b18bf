//! Session-level tests.
//!
//! - `determinism.rs`: same seed and inputs give identical worlds
//! - `integration.rs`: full games through the public session API
//! - `helpers.rs`: session setup and queries

mod helpers;

pub use helpers::*;
