//! Game record store implementations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::params;

use crate::error::Result;
use crate::models::GameRecord;

use super::Database;

/// Trait for append-only game record storage
///
/// The sync subsystem only ever reads a snapshot of the full history and
/// appends records it has accepted; nothing is reordered or deleted.
pub trait GameStore: Send + Sync {
    /// Append a completed game to the history
    fn append(&self, record: &GameRecord) -> Result<()>;

    /// Read the full history in insertion order
    fn read_all(&self) -> Result<Vec<GameRecord>>;
}

/// `SQLite` implementation of `GameStore`
pub struct SqliteGameStore {
    db: Database,
}

impl SqliteGameStore {
    /// Create a store backed by the given database
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }
}

impl GameStore for SqliteGameStore {
    fn append(&self, record: &GameRecord) -> Result<()> {
        let players = serde_json::to_string(&record.players)?;
        let winners = serde_json::to_string(&record.winners)?;

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO games (date, players, winners, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.date,
                    players,
                    winners,
                    Utc::now().timestamp_millis()
                ],
            )?;
            Ok(())
        })
    }

    fn read_all(&self) -> Result<Vec<GameRecord>> {
        let rows = self.db.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT date, players, winners FROM games ORDER BY id ASC")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(date, players, winners)| {
                Ok(GameRecord {
                    players: serde_json::from_str(&players)?,
                    date,
                    winners: serde_json::from_str(&winners)?,
                })
            })
            .collect()
    }
}

/// In-memory implementation of `GameStore`
///
/// Used by tests and for simulating a second peer inside one process.
#[derive(Default)]
pub struct MemoryGameStore {
    records: Mutex<Vec<GameRecord>>,
}

impl MemoryGameStore {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given history
    #[must_use]
    pub fn with_records(records: Vec<GameRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl GameStore for MemoryGameStore {
    fn append(&self, record: &GameRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<GameRecord>> {
        Ok(self.records.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Player;

    fn sample_record(date: &str) -> GameRecord {
        GameRecord::with_date(
            vec![
                Player::new("Alice", "red", 30),
                Player::new("Bob", "blue", 25),
            ],
            date,
        )
        .unwrap()
    }

    fn setup() -> SqliteGameStore {
        SqliteGameStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_append_and_read_all() {
        let store = setup();

        let record = sample_record("2024-01-01T00:00:00Z");
        store.append(&record).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all, vec![record]);
    }

    #[test]
    fn test_read_all_preserves_insertion_order() {
        let store = setup();

        let first = sample_record("2024-01-01T00:00:00Z");
        let second = sample_record("2024-01-02T00:00:00Z");
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let all = store.read_all().unwrap();
        assert_eq!(all, vec![first, second]);
    }

    #[test]
    fn test_duplicate_identities_both_stored() {
        // The store has no opinion on duplicates; that is the merge
        // engine's call.
        let store = setup();

        let record = sample_record("2024-01-01T00:00:00Z");
        store.append(&record).unwrap();
        store.append(&record).unwrap();

        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryGameStore::new();
        let record = sample_record("2024-01-01T00:00:00Z");

        store.append(&record).unwrap();
        assert_eq!(store.read_all().unwrap(), vec![record]);
    }
}
