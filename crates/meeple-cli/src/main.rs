//! Meeple CLI - Carcassonne score tracking from the command line
//!
//! Record finished games, browse the history and leaderboard, and sync
//! with another device over the local network or via snapshot files.

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands, SyncCommands};
use commands::common::resolve_db_path;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meeple_core=info".parse().expect("valid directive"))
                .add_directive("meeple_cli=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;

    match cli.command {
        Commands::Record { players, date } => {
            commands::record::run_record(&players, date.as_deref(), &db_path)?;
        }
        Commands::List { limit, json } => commands::list::run_list(limit, json, &db_path)?,
        Commands::Leaderboard { json } => commands::leaderboard::run_leaderboard(json, &db_path)?,
        Commands::Export { output } => commands::export::run_export(output.as_deref(), &db_path)?,
        Commands::Import { input } => commands::import::run_import(input.as_deref(), &db_path)?,
        Commands::Sync { command } => match command {
            SyncCommands::Host { port } => commands::sync::run_sync_host(port, &db_path).await?,
            SyncCommands::Connect { addr } => {
                commands::sync::run_sync_connect(addr, &db_path).await?;
            }
            SyncCommands::Status => commands::sync::run_sync_status(),
        },
        Commands::Completions { shell, output } => {
            commands::completions::run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
