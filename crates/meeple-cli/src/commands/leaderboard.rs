use std::path::Path;

use meeple_core::db::GameStore;
use meeple_core::models::leaderboard;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_leaderboard(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let board = leaderboard(&store.read_all()?);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    if board.is_empty() {
        println!("No games recorded yet.");
        return Ok(());
    }

    for (rank, entry) in board.iter().enumerate() {
        println!("{:>3}. {:<20} {} win(s)", rank + 1, entry.name, entry.wins);
    }
    Ok(())
}
