use std::path::Path;

use meeple_core::db::GameStore;

use crate::commands::common::{format_game_lines, open_store};
use crate::error::CliError;

pub fn run_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let mut records = store.read_all()?;
    records.reverse();
    records.truncate(limit);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No games recorded yet.");
        return Ok(());
    }

    for line in format_game_lines(&records) {
        println!("{line}");
    }
    Ok(())
}
