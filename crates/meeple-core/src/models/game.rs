//! Game record model

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One player's seat in a finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within a record (case-insensitive)
    pub name: String,
    /// Meeple color chosen for the game
    pub color: String,
    /// Final score
    pub score: u32,
}

impl Player {
    /// Create a player entry with a final score
    pub fn new(name: impl Into<String>, color: impl Into<String>, score: u32) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            score,
        }
    }
}

/// A completed game, immutable once created
///
/// The `winners` field is serialized as `winner` because that is the shape
/// the transferable payload format uses; both devices in an exchange must
/// produce and accept it byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Seats in play order
    pub players: Vec<Player>,
    /// Completion timestamp, ISO-8601
    pub date: String,
    /// Names of all players that reached the top score (ties allowed)
    #[serde(rename = "winner")]
    pub winners: Vec<String>,
}

impl GameRecord {
    /// Record a game finished right now
    pub fn new(players: Vec<Player>) -> Result<Self> {
        let date = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        Self::with_date(players, date)
    }

    /// Record a game finished at the given ISO-8601 timestamp
    pub fn with_date(players: Vec<Player>, date: impl Into<String>) -> Result<Self> {
        if players.is_empty() {
            return Err(Error::InvalidInput(
                "A game needs at least one player".into(),
            ));
        }

        for (index, player) in players.iter().enumerate() {
            if player.name.trim().is_empty() {
                return Err(Error::InvalidInput("Player name cannot be empty".into()));
            }
            let duplicate = players[..index]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&player.name));
            if duplicate {
                return Err(Error::InvalidInput(format!(
                    "Duplicate player name: {}",
                    player.name
                )));
            }
        }

        let winners = top_scorers(&players);
        Ok(Self {
            players,
            date: date.into(),
            winners,
        })
    }

    /// Derived deduplication key: completion date plus sorted player names
    ///
    /// Two records with the same identity are treated as the same game by
    /// the merge engine. Scores do not participate in the key.
    #[must_use]
    pub fn identity(&self) -> RecordIdentity {
        let mut names: Vec<&str> = self.players.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        RecordIdentity(format!("{}_{}", self.date, names.join(",")))
    }
}

/// Names of every player holding the maximum score
fn top_scorers(players: &[Player]) -> Vec<String> {
    let Some(top) = players.iter().map(|p| p.score).max() else {
        return Vec::new();
    };
    players
        .iter()
        .filter(|p| p.score == top)
        .map(|p| p.name.clone())
        .collect()
}

/// Deduplication key derived from a game record's content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordIdentity(String);

impl RecordIdentity {
    /// Borrow the key's string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
