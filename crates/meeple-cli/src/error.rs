use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] meeple_core::Error),
    #[error(transparent)]
    Sync(#[from] meeple_core::sync::SyncError),
    #[error(transparent)]
    Transport(#[from] meeple_core::sync::TransportError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid player spec '{0}', expected NAME:COLOR:SCORE")]
    InvalidPlayerSpec(String),
    #[error("Invalid date '{0}': {1}")]
    InvalidDate(String, String),
    #[error("Import rejected: {0}")]
    ImportRejected(String),
    #[error("Could not determine a data directory; pass --db-path")]
    NoDataDir,
    #[error("Sync did not complete: {0}")]
    SyncFailed(String),
}
