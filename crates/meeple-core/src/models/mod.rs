//! Data models for Meeple

mod game;
mod leaderboard;

pub use game::{GameRecord, Player, RecordIdentity};
pub use leaderboard::{leaderboard, LeaderboardEntry};
