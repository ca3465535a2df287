//! Win-count leaderboard across the recorded history

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::GameRecord;

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub wins: usize,
}

/// Count wins per player across all records, most wins first
///
/// Ties in win count are ordered by name so the output is deterministic.
#[must_use]
pub fn leaderboard(records: &[GameRecord]) -> Vec<LeaderboardEntry> {
    let mut wins: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for winner in &record.winners {
            *wins.entry(winner.as_str()).or_default() += 1;
        }
    }

    let mut entries: Vec<LeaderboardEntry> = wins
        .into_iter()
        .map(|(name, wins)| LeaderboardEntry {
            name: name.to_string(),
            wins,
        })
        .collect();
    entries.sort_by(|a, b| b.wins.cmp(&a.wins).then_with(|| a.name.cmp(&b.name)));
    entries
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Player;

    fn game(date: &str, players: Vec<Player>) -> GameRecord {
        GameRecord::with_date(players, date).unwrap()
    }

    #[test]
    fn test_counts_wins_across_games() {
        let records = vec![
            game(
                "2024-01-01T00:00:00Z",
                vec![
                    Player::new("Alice", "red", 30),
                    Player::new("Bob", "blue", 25),
                ],
            ),
            game(
                "2024-01-02T00:00:00Z",
                vec![
                    Player::new("Alice", "red", 40),
                    Player::new("Bob", "blue", 20),
                ],
            ),
            game(
                "2024-01-03T00:00:00Z",
                vec![
                    Player::new("Alice", "red", 10),
                    Player::new("Bob", "blue", 50),
                ],
            ),
        ];

        let board = leaderboard(&records);
        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    name: "Alice".into(),
                    wins: 2
                },
                LeaderboardEntry {
                    name: "Bob".into(),
                    wins: 1
                },
            ]
        );
    }

    #[test]
    fn test_ties_count_for_everyone() {
        let records = vec![game(
            "2024-01-01T00:00:00Z",
            vec![
                Player::new("Alice", "red", 30),
                Player::new("Bob", "blue", 30),
            ],
        )];

        let board = leaderboard(&records);
        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|entry| entry.wins == 1));
    }

    #[test]
    fn test_empty_history() {
        assert!(leaderboard(&[]).is_empty());
    }
}
