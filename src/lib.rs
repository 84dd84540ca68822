//! Library surface for the multiplayer trading/combat server, split out
//! so integration tests can drive it without spawning the binary.
pub mod account;
pub mod analytics;
pub mod assets;
pub mod campaign;
pub mod combat;
pub mod combat_tables;
pub mod config;
pub mod crew;
pub mod dispatch;
pub mod economy;
pub mod error;
pub mod game;
pub mod handlers;
pub mod mail;
pub mod news;
pub mod payloads;
pub mod planet;
pub mod player;
pub mod rng;
pub mod session;
pub mod ship;
pub mod travel;
pub mod universe;

#[macro_use]
mod cov_util;
