//! Wire protocol for the streaming link
//!
//! A frame body is one tag byte followed by the message payload. Game
//! records travel as the transferable payload format: a JSON array of
//! `{players, date, winner}` objects, identical to what the one-shot
//! snapshot path produces, so either path interoperates with any
//! implementation of the format.

use thiserror::Error;

use crate::models::GameRecord;

const TAG_RECORDS: u8 = 1;
const TAG_REQUEST: u8 = 2;

/// Messages exchanged between two peers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// Full snapshot of the sender's history
    Records(Vec<GameRecord>),
    /// Explicit "send me your records" command
    Request,
}

/// Wire decoding failures
#[derive(Debug, Error)]
pub enum WireError {
    /// Frame body was empty
    #[error("empty frame")]
    EmptyFrame,

    /// First byte is not a known message tag
    #[error("unknown frame tag: {0}")]
    UnknownTag(u8),

    /// Records payload was not a valid JSON array of games
    #[error("invalid records payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Encode a message into a frame body
pub fn encode(message: &WireMessage) -> Result<Vec<u8>, serde_json::Error> {
    match message {
        WireMessage::Records(records) => {
            let mut body = vec![TAG_RECORDS];
            body.extend_from_slice(&serde_json::to_vec(records)?);
            Ok(body)
        }
        WireMessage::Request => Ok(vec![TAG_REQUEST]),
    }
}

/// Decode a frame body into a message
pub fn decode(body: &[u8]) -> Result<WireMessage, WireError> {
    let (&tag, payload) = body.split_first().ok_or(WireError::EmptyFrame)?;
    match tag {
        TAG_RECORDS => Ok(WireMessage::Records(serde_json::from_slice(payload)?)),
        TAG_REQUEST => Ok(WireMessage::Request),
        other => Err(WireError::UnknownTag(other)),
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
    fn test_records_round_trip() {
        let message = WireMessage::Records(sample_records());
        let body = encode(&message).unwrap();
        assert_eq!(decode(&body).unwrap(), message);
    }

    #[test]
    fn test_request_round_trip() {
        let body = encode(&WireMessage::Request).unwrap();
        assert_eq!(body, vec![TAG_REQUEST]);
        assert_eq!(decode(&body).unwrap(), WireMessage::Request);
    }

    #[test]
    fn test_records_payload_is_the_interop_array() {
        let body = encode(&WireMessage::Records(sample_records())).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body[1..]).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["winner"], serde_json::json!(["Alice"]));
        assert_eq!(first["players"][0]["name"], serde_json::json!("Alice"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(&[]), Err(WireError::EmptyFrame)));
        assert!(matches!(decode(&[9]), Err(WireError::UnknownTag(9))));
        assert!(matches!(
            decode(&[TAG_RECORDS, b'n', b'o', b'p', b'e']),
            Err(WireError::Payload(_))
        ));
    }
}
