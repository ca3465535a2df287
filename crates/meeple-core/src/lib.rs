//! meeple-core - Core library for Meeple
//!
//! This crate contains the game record models, the local record store,
//! and the device-to-device sync engine used by all Meeple interfaces.

pub mod db;
pub mod error;
pub mod models;
pub mod sync;

pub use error::{Error, Result};
pub use models::{GameRecord, Player, RecordIdentity};
