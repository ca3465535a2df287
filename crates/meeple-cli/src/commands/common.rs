use std::path::{Path, PathBuf};
use std::sync::Arc;

use meeple_core::db::{Database, SqliteGameStore};
use meeple_core::models::{GameRecord, Player};

use crate::error::CliError;

/// Resolve the database path: explicit override, or the platform data dir
pub fn resolve_db_path(override_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = override_path {
        return Ok(path);
    }
    let base = dirs::data_dir().ok_or(CliError::NoDataDir)?;
    Ok(base.join("meeple").join("meeple.db"))
}

/// Open (creating if needed) the game store at the given path
pub fn open_store(db_path: &Path) -> Result<Arc<SqliteGameStore>, CliError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(db_path)?;
    Ok(Arc::new(SqliteGameStore::new(db)))
}

/// Parse a `NAME:COLOR:SCORE` player spec
pub fn parse_player_spec(spec: &str) -> Result<Player, CliError> {
    let invalid = || CliError::InvalidPlayerSpec(spec.to_string());

    let mut parts = spec.splitn(3, ':');
    let name = parts.next().filter(|s| !s.trim().is_empty()).ok_or_else(invalid)?;
    let color = parts.next().filter(|s| !s.trim().is_empty()).ok_or_else(invalid)?;
    let score: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(invalid)?;

    Ok(Player::new(name.trim(), color.trim(), score))
}

/// Render games as aligned terminal lines
pub fn format_game_lines(records: &[GameRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let seats = record
                .players
                .iter()
                .map(|p| format!("{} ({}) {}", p.name, p.color, p.score))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{}  {}  winner: {}",
                record.date,
                seats,
                record.winners.join(", ")
            )
        })
        .collect()
}
