//! Hunt progression core: reveal encoding, quest-item state, the durable
//! ascendancy ledger, proximity puzzles, the ritual orchestrator, and the
//! encounter outcome reconciler.
//!
//! Nothing in this crate touches a real world. Inputs arrive as snapshots
//! (player look/position, sky state, observed dropped items) and outputs
//! leave as [`HuntEffect`] cues the host engine translates into sounds,
//! particles, chat, and inventory changes.

mod components;
mod config;
mod effects;
mod encoding;
mod encounter;
mod ledger;
mod orb;
mod puzzle;
mod ritual;
mod service;

pub use components::*;
pub use config::*;
pub use effects::*;
pub use encoding::*;
pub use encounter::*;
pub use ledger::*;
pub use orb::*;
pub use puzzle::*;
pub use ritual::*;
pub use service::*;
