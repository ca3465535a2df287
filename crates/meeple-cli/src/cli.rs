use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "meeple")]
#[command(about = "Track Carcassonne scores and sync game history between devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a finished game
    #[command(alias = "add")]
    Record {
        /// Players as NAME:COLOR:SCORE
        #[arg(required = true, value_name = "NAME:COLOR:SCORE")]
        players: Vec<String>,
        /// Completion time (ISO-8601), defaults to now
        #[arg(long, value_name = "TIMESTAMP")]
        date: Option<String>,
    },
    /// List recorded games, newest first
    List {
        /// Number of games to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the win-count leaderboard
    Leaderboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the game history as a transferable snapshot
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import a transferable snapshot
    Import {
        /// Optional input path (stdin when omitted)
        #[arg(value_name = "PATH")]
        input: Option<PathBuf>,
    },
    /// Sync game history with a nearby device
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Wait for a peer to connect and exchange histories with them
    Host {
        /// Port to listen on
        #[arg(short, long, default_value = "7747")]
        port: u16,
    },
    /// Connect to a hosting peer and run an exchange
    Connect {
        /// Peer address, e.g. 192.168.1.20:7747
        addr: SocketAddr,
    },
    /// Show sync capability for this platform
    Status,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
