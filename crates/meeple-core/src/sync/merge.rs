//! Merging two divergent game histories
//!
//! Records are keyed by [`RecordIdentity`]: completion date plus the
//! sorted player names. An incoming record whose identity already exists
//! locally is dropped; everything else is appended in encounter order.
//! The exclusion set is the pre-merge local history, so merging the same
//! batch twice adds nothing the second time.
//!
//! Identity deliberately ignores scores, which means a "corrected" replay
//! of a game (same date and players, different scores) is dropped like any
//! other duplicate. Those drops are surfaced as [`ScoreConflict`]s in the
//! report rather than lost silently.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::db::GameStore;
use crate::error::Result;
use crate::models::{GameRecord, Player};

use super::snapshot;

/// Outcome of one merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Records appended to the local store
    pub added: usize,
    /// Identity collisions whose scores disagreed
    pub conflicts: Vec<ScoreConflict>,
}

/// A dropped incoming record that matched a local identity but not its
/// scores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreConflict {
    /// Shared identity of the colliding records
    pub identity: String,
    /// Local seats, kept
    pub local: Vec<Player>,
    /// Incoming seats, dropped
    pub incoming: Vec<Player>,
}

/// Result of importing a transferable payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    /// Whether the batch was applied at all
    pub accepted: bool,
    /// Records appended when accepted
    pub added: usize,
    /// Why the batch was rejected, when it was
    pub error: Option<String>,
}

impl ImportOutcome {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            accepted: false,
            added: 0,
            error: Some(error.into()),
        }
    }
}

/// Merge incoming records into the local store
///
/// Appends every record whose identity is not already present, in
/// encounter order, and reports how many were absorbed. Duplicates within
/// the incoming batch itself are each checked against the pre-merge
/// snapshot only, so they are all appended.
pub fn merge(store: &dyn GameStore, incoming: &[GameRecord]) -> Result<MergeReport> {
    let local = store.read_all()?;
    let existing: HashMap<String, &GameRecord> = local
        .iter()
        .map(|record| (record.identity().as_str().to_string(), record))
        .collect();

    let mut report = MergeReport::default();
    for record in incoming {
        let identity = record.identity();
        match existing.get(identity.as_str()) {
            None => {
                store.append(record)?;
                report.added += 1;
            }
            Some(local_record) => {
                if scores_differ(local_record, record) {
                    tracing::warn!(
                        identity = %identity,
                        "dropping duplicate game with mismatched scores"
                    );
                    report.conflicts.push(ScoreConflict {
                        identity: identity.as_str().to_string(),
                        local: local_record.players.clone(),
                        incoming: record.players.clone(),
                    });
                }
            }
        }
    }

    tracing::info!(added = report.added, "merge complete");
    Ok(report)
}

/// Whether two records with the same identity disagree on any score
fn scores_differ(local: &GameRecord, incoming: &GameRecord) -> bool {
    let mut local_scores: Vec<(&str, u32)> = local
        .players
        .iter()
        .map(|p| (p.name.as_str(), p.score))
        .collect();
    let mut incoming_scores: Vec<(&str, u32)> = incoming
        .players
        .iter()
        .map(|p| (p.name.as_str(), p.score))
        .collect();
    local_scores.sort_unstable();
    incoming_scores.sort_unstable();
    local_scores != incoming_scores
}

/// Serialize the full local history as the transferable payload
pub fn export_snapshot(store: &dyn GameStore) -> Result<String> {
    let records = store.read_all()?;
    Ok(snapshot::encode_snapshot(&records)?)
}

/// Validate and merge a transferable payload
///
/// The whole batch is checked before anything is applied: the payload
/// must be an array, and every element must carry a `players` array, a
/// `date`, and a `winner` array. Any violation rejects the batch
/// atomically with zero records applied. Shape is all that's checked;
/// semantically odd records (say, an empty players list) pass through
/// untouched.
pub fn import_snapshot(store: &dyn GameStore, payload: &str) -> ImportOutcome {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(error) => return ImportOutcome::rejected(format!("payload is not valid JSON: {error}")),
    };

    let Some(items) = value.as_array() else {
        return ImportOutcome::rejected("payload must be an array of games");
    };

    for (index, item) in items.iter().enumerate() {
        if !has_record_shape(item) {
            return ImportOutcome::rejected(format!("game at index {index} has an invalid shape"));
        }
    }

    let records: Vec<GameRecord> = match serde_json::from_value(value) {
        Ok(records) => records,
        Err(error) => return ImportOutcome::rejected(format!("invalid game data: {error}")),
    };

    match merge(store, &records) {
        Ok(report) => ImportOutcome {
            accepted: true,
            added: report.added,
            error: None,
        },
        Err(error) => ImportOutcome::rejected(error.to_string()),
    }
}

fn has_record_shape(item: &Value) -> bool {
    item.get("players").is_some_and(Value::is_array)
        && item.get("date").is_some()
        && item.get("winner").is_some_and(Value::is_array)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::MemoryGameStore;

    fn game(date: &str, seats: &[(&str, &str, u32)]) -> GameRecord {
        GameRecord::with_date(
            seats
                .iter()
                .map(|(name, color, score)| Player::new(*name, *color, *score))
                .collect(),
            date,
        )
        .unwrap()
    }

    fn alice_bob() -> GameRecord {
        game(
            "2024-01-01T00:00:00Z",
            &[("Alice", "red", 30), ("Bob", "blue", 25)],
        )
    }

    fn carol_dave() -> GameRecord {
        game(
            "2024-01-02T00:00:00Z",
            &[("Carol", "green", 40), ("Dave", "black", 10)],
        )
    }

    #[test]
    fn test_merge_of_known_records_adds_nothing() {
        let store = MemoryGameStore::with_records(vec![alice_bob(), carol_dave()]);

        let report = merge(&store, &[alice_bob(), carol_dave()]).unwrap();

        assert_eq!(report.added, 0);
        assert!(report.conflicts.is_empty());
        assert_eq!(store.read_all().unwrap(), vec![alice_bob(), carol_dave()]);
    }

    #[test]
    fn test_merge_of_disjoint_records_adds_all_in_order() {
        let store = MemoryGameStore::with_records(vec![alice_bob()]);

        let report = merge(&store, &[carol_dave()]).unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(store.read_all().unwrap(), vec![alice_bob(), carol_dave()]);
    }

    #[test]
    fn test_merge_is_idempotent_across_passes() {
        let store = MemoryGameStore::new();

        let first = merge(&store, &[alice_bob(), carol_dave()]).unwrap();
        let second = merge(&store, &[alice_bob(), carol_dave()]).unwrap();

        assert_eq!(first.added, 2);
        assert_eq!(second.added, 0);
        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_batch_internal_duplicates_are_each_appended() {
        // Only the pre-merge snapshot excludes; the batch does not see
        // its own earlier entries.
        let store = MemoryGameStore::new();

        let report = merge(&store, &[alice_bob(), alice_bob()]).unwrap();

        assert_eq!(report.added, 2);
        assert_eq!(store.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_score_mismatch_is_dropped_but_surfaced() {
        let store = MemoryGameStore::with_records(vec![alice_bob()]);
        let corrected = game(
            "2024-01-01T00:00:00Z",
            &[("Alice", "red", 35), ("Bob", "blue", 25)],
        );

        let report = merge(&store, &[corrected.clone()]).unwrap();

        assert_eq!(report.added, 0);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].incoming, corrected.players);
        assert_eq!(store.read_all().unwrap(), vec![alice_bob()]);
    }

    #[test]
    fn test_same_scores_different_colors_is_not_a_conflict() {
        let store = MemoryGameStore::with_records(vec![alice_bob()]);
        let recolored = game(
            "2024-01-01T00:00:00Z",
            &[("Alice", "yellow", 30), ("Bob", "blue", 25)],
        );

        let report = merge(&store, &[recolored]).unwrap();

        assert_eq!(report.added, 0);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn test_two_device_exchange_scenario() {
        // Device A holds one game; device B holds the same plus another.
        let store_a = MemoryGameStore::with_records(vec![alice_bob()]);
        let store_b = MemoryGameStore::with_records(vec![alice_bob(), carol_dave()]);

        let payload = export_snapshot(&store_b).unwrap();
        let outcome = import_snapshot(&store_a, &payload);

        assert!(outcome.accepted);
        assert_eq!(outcome.added, 1);
        assert_eq!(store_a.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_import_round_trip_then_replay() {
        let source = MemoryGameStore::with_records(vec![alice_bob(), carol_dave()]);
        let target = MemoryGameStore::new();

        let payload = export_snapshot(&source).unwrap();

        let first = import_snapshot(&target, &payload);
        assert!(first.accepted);
        assert_eq!(first.added, 2);

        let second = import_snapshot(&target, &payload);
        assert!(second.accepted);
        assert_eq!(second.added, 0);
        assert_eq!(target.read_all().unwrap().len(), 2);
    }

    #[test]
    fn test_import_rejects_invalid_element_atomically() {
        let store = MemoryGameStore::new();

        // Element 3 of 5 is missing its date
        let payload = serde_json::json!([
            {"players": [{"name": "A", "color": "red", "score": 1}], "date": "2024-01-01T00:00:00Z", "winner": ["A"]},
            {"players": [{"name": "B", "color": "red", "score": 1}], "date": "2024-01-02T00:00:00Z", "winner": ["B"]},
            {"players": [{"name": "C", "color": "red", "score": 1}], "winner": ["C"]},
            {"players": [{"name": "D", "color": "red", "score": 1}], "date": "2024-01-04T00:00:00Z", "winner": ["D"]},
            {"players": [{"name": "E", "color": "red", "score": 1}], "date": "2024-01-05T00:00:00Z", "winner": ["E"]},
        ])
        .to_string();

        let outcome = import_snapshot(&store, &payload);

        assert!(!outcome.accepted);
        assert_eq!(outcome.added, 0);
        assert!(outcome.error.unwrap().contains("index 2"));
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_import_rejects_non_array_payload() {
        let store = MemoryGameStore::new();

        let outcome = import_snapshot(&store, "{\"games\": []}");
        assert!(!outcome.accepted);
        assert_eq!(outcome.added, 0);

        let outcome = import_snapshot(&store, "not json at all");
        assert!(!outcome.accepted);
        assert!(outcome.error.unwrap().contains("not valid JSON"));
    }

    #[test]
    fn test_import_accepts_semantically_odd_records() {
        let store = MemoryGameStore::new();

        let payload = r#"[{"players": [], "date": "2024-01-01T00:00:00Z", "winner": []}]"#;
        let outcome = import_snapshot(&store, payload);

        assert!(outcome.accepted);
        assert_eq!(outcome.added, 1);
    }

    #[test]
    fn test_import_of_empty_array_is_a_valid_no_op() {
        let store = MemoryGameStore::new();

        let outcome = import_snapshot(&store, "[]");
        assert!(outcome.accepted);
        assert_eq!(outcome.added, 0);
        assert!(outcome.error.is_none());
    }
}
