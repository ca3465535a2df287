use std::io;
use std::path::Path;

use meeple_core::sync::merge::import_snapshot;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_import(input: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let payload = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => io::read_to_string(io::stdin())?,
    };

    let store = open_store(db_path)?;
    let outcome = import_snapshot(store.as_ref(), &payload);

    if !outcome.accepted {
        return Err(CliError::ImportRejected(
            outcome.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    if outcome.added == 0 {
        println!("Nothing new to import.");
    } else {
        println!("Imported {} new game(s)", outcome.added);
    }
    Ok(())
}
