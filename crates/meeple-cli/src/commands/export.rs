use std::path::Path;

use meeple_core::sync::merge::export_snapshot;

use crate::commands::common::open_store;
use crate::error::CliError;

pub fn run_export(output: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path)?;
    let payload = export_snapshot(store.as_ref())?;

    match output {
        Some(path) => {
            std::fs::write(path, payload)?;
            println!("Exported game history to {}", path.display());
        }
        None => println!("{payload}"),
    }
    Ok(())
}
