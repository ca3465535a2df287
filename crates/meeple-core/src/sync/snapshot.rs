//! One-shot snapshot exchange
//!
//! The alternative to a live link: encode the whole local history into a
//! transferable payload on one device, carry it over visually (or by
//! copy/paste), decode it on the other. The payload is available
//! atomically, so there is no chunking; a decoded payload is treated as
//! one completed inbound message.
//!
//! [`Scanner`] models the decoder hardware as what it is on a real device:
//! a singleton resource. Only one scan session can be open at a time, the
//! session releases the resource on every exit path, and completions
//! carrying a stale generation are discarded so a cancelled scan can never
//! be resurrected by a late decode.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::models::GameRecord;

/// Scan lifecycle failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Another scan session currently holds the decoder
    #[error("scanner is already in use")]
    Busy,

    /// The scanned payload was not a record snapshot
    #[error("scanned payload could not be decoded: {0}")]
    Decode(String),
}

/// Encode records as the transferable payload format
///
/// Pretty-printed with stable field order; this exact shape is what any
/// other implementation of the exchange must accept.
pub fn encode_snapshot(records: &[GameRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Decode a transferable payload back into records
pub fn decode_snapshot(payload: &str) -> Result<Vec<GameRecord>, ScanError> {
    serde_json::from_str(payload).map_err(|error| ScanError::Decode(error.to_string()))
}

#[derive(Debug, Default)]
struct ScanState {
    active: bool,
    generation: u64,
}

/// Exclusive handle dispenser for the scan resource; cloning shares the
/// same underlying resource
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    state: Arc<Mutex<ScanState>>,
}

impl Scanner {
    /// Create a scanner with the resource free
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the scan resource
    ///
    /// Fails with [`ScanError::Busy`] while another session is open.
    pub fn begin(&self) -> Result<ScanSession, ScanError> {
        let mut state = self.state.lock();
        if state.active {
            return Err(ScanError::Busy);
        }
        state.active = true;
        state.generation += 1;
        Ok(ScanSession {
            scanner: self.clone(),
            generation: state.generation,
        })
    }

    /// Deliver a decoded payload for the session with the given generation
    ///
    /// Returns `None` when the generation is stale (the session was
    /// cancelled or superseded); the payload is discarded, not an error.
    /// A current-generation submission ends the session.
    pub fn submit(
        &self,
        generation: u64,
        payload: &str,
    ) -> Option<Result<Vec<GameRecord>, ScanError>> {
        {
            let mut state = self.state.lock();
            if !state.active || state.generation != generation {
                tracing::debug!(generation, "discarding stale scan completion");
                return None;
            }
            state.active = false;
        }
        Some(decode_snapshot(payload))
    }

    fn release(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.active && state.generation == generation {
            state.active = false;
        }
    }
}

/// An open scan; holds the resource until completed, cancelled, or dropped
#[derive(Debug)]
pub struct ScanSession {
    scanner: Scanner,
    generation: u64,
}

impl ScanSession {
    /// Generation token the decoder must echo back via [`Scanner::submit`]
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop scanning; any in-flight decode for this session becomes stale
    pub fn cancel(self) {
        // Drop does the release; consuming self makes the terminal
        // transition explicit at the call site.
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.scanner.release(self.generation);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::Player;

    fn sample_records() -> Vec<GameRecord> {
        vec![GameRecord::with_date(
            vec![
                Player::new("Alice", "red", 30),
                Player::new("Bob", "blue", 25),
            ],
            "2024-01-01T00:00:00Z",
        )
        .unwrap()]
    }

    #[test]
    fn test_snapshot_round_trip() {
        let records = sample_records();
        let payload = encode_snapshot(&records).unwrap();
        assert_eq!(decode_snapshot(&payload).unwrap(), records);
    }

    #[test]
    fn test_snapshot_is_pretty_printed_interop_shape() {
        let payload = encode_snapshot(&sample_records()).unwrap();
        assert!(payload.contains('\n'));
        assert!(payload.contains("\"winner\""));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_snapshot("not json"),
            Err(ScanError::Decode(_))
        ));
    }

    #[test]
    fn test_scanner_is_exclusive() {
        let scanner = Scanner::new();
        let session = scanner.begin().unwrap();
        assert_eq!(scanner.begin().unwrap_err(), ScanError::Busy);
        drop(session);
        assert!(scanner.begin().is_ok());
    }

    #[test]
    fn test_submit_completes_current_session() {
        let scanner = Scanner::new();
        let session = scanner.begin().unwrap();
        let payload = encode_snapshot(&sample_records()).unwrap();

        let result = scanner.submit(session.generation(), &payload).unwrap();
        assert_eq!(result.unwrap(), sample_records());

        // Completion ended the session; the resource is free again
        assert!(scanner.begin().is_ok());
    }

    #[test]
    fn test_cancel_makes_late_completion_stale() {
        let scanner = Scanner::new();
        let session = scanner.begin().unwrap();
        let generation = session.generation();
        session.cancel();

        let payload = encode_snapshot(&sample_records()).unwrap();
        assert!(scanner.submit(generation, &payload).is_none());
    }

    #[test]
    fn test_stale_generation_from_previous_session_is_discarded() {
        let scanner = Scanner::new();
        let first = scanner.begin().unwrap();
        let old_generation = first.generation();
        first.cancel();

        let _second = scanner.begin().unwrap();
        let payload = encode_snapshot(&sample_records()).unwrap();
        assert!(scanner.submit(old_generation, &payload).is_none());
    }

    #[test]
    fn test_decode_failure_still_ends_session() {
        let scanner = Scanner::new();
        let session = scanner.begin().unwrap();

        let result = scanner.submit(session.generation(), "garbage").unwrap();
        assert!(result.is_err());
        assert!(scanner.begin().is_ok());
    }
}
