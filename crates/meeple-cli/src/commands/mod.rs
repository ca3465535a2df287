pub mod common;
pub mod completions;
pub mod export;
pub mod import;
pub mod leaderboard;
pub mod list;
pub mod record;
pub mod sync;
