use std::path::Path;

use chrono::DateTime;
use meeple_core::db::GameStore;
use meeple_core::models::GameRecord;

use crate::commands::common::{open_store, parse_player_spec};
use crate::error::CliError;

pub fn run_record(
    specs: &[String],
    date: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let players = specs
        .iter()
        .map(|spec| parse_player_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let record = match date {
        Some(raw) => {
            DateTime::parse_from_rfc3339(raw)
                .map_err(|error| CliError::InvalidDate(raw.to_string(), error.to_string()))?;
            GameRecord::with_date(players, raw)?
        }
        None => GameRecord::new(players)?,
    };

    let store = open_store(db_path)?;
    store.append(&record)?;

    println!(
        "Recorded game on {} - winner: {}",
        record.date,
        record.winners.join(", ")
    );
    Ok(())
}
