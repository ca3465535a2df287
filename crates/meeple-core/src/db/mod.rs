//! Database layer for Meeple

mod connection;
mod migrations;
mod store;

pub use connection::Database;
pub use store::{GameStore, MemoryGameStore, SqliteGameStore};
