//! Payload decoding and validation.
//!
//! # Responsibilities
//! - Decode the JSON envelope sent by the front end
//! - Require non-empty `username` and `message`
//! - Encode outbound envelopes for the relay client
//!
//! # Design Decisions
//! - Unknown keys are ignored
//! - Non-string field values are an encoding error, not a missing field
//! - Whitespace-only values count as present; only "" is empty

use serde::Serialize;
use serde_json::{Map, Value};

use crate::message::record::MessageRecord;

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed-encoding: {0}")]
    MalformedEncoding(String),
    #[error("missing-field: {0}")]
    MissingField(&'static str),
}

impl ValidationError {
    /// Stable reason code for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MalformedEncoding(_) => "malformed-encoding",
            ValidationError::MissingField(_) => "missing-field",
        }
    }
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    username: &'a str,
    message: &'a str,
}

/// Parse raw inbound bytes into a record.
pub fn parse(raw: &[u8]) -> Result<MessageRecord, ValidationError> {
    let mut envelope: Map<String, Value> = serde_json::from_slice(raw)
        .map_err(|e| ValidationError::MalformedEncoding(e.to_string()))?;

    let username = take_text(&mut envelope, "username")?;
    let message = take_text(&mut envelope, "message")?;

    Ok(MessageRecord::new(username, message))
}

fn take_text(envelope: &mut Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match envelope.remove(field) {
        Some(Value::String(v)) if !v.is_empty() => Ok(v),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(ValidationError::MissingField(field)),
        Some(other) => Err(ValidationError::MalformedEncoding(format!(
            "field '{}' must be a string, got {}",
            field, other
        ))),
    }
}

/// Encode a submission in the relay wire format.
pub fn encode(username: &str, message: &str) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&OutboundEnvelope { username, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_complete_payload() {
        let record = parse(br#"{"username":"alice","message":"hi"}"#).unwrap();
        assert_eq!(record.username(), "alice");
        assert_eq!(record.message(), "hi");
    }

    #[test]
    fn ignores_extra_keys() {
        let record = parse(br#"{"username":"a","message":"b","room":"x"}"#).unwrap();
        assert_eq!(record.username(), "a");
    }

    #[test]
    fn empty_username_is_missing() {
        let err = parse(br#"{"username":"","message":"hi"}"#).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("username"));
        assert_eq!(err.reason(), "missing-field");
    }

    #[test]
    fn absent_message_is_missing() {
        let err = parse(br#"{"username":"alice"}"#).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("message"));
    }

    #[test]
    fn garbage_is_malformed() {
        let payloads: [&[u8]; 5] = [b"not json", b"[1,2]", b"{\"username\":", b"\xff\xfe", b""];
        for raw in payloads {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.reason(), "malformed-encoding", "payload {:?}", raw);
        }
    }

    #[test]
    fn non_string_field_is_malformed() {
        let err = parse(br#"{"username":7,"message":"hi"}"#).unwrap_err();
        assert_eq!(err.reason(), "malformed-encoding");
    }

    #[test]
    fn positional_array_is_malformed() {
        let err = parse(br#"["alice","hi"]"#).unwrap_err();
        assert_eq!(err.reason(), "malformed-encoding");
    }

    #[test]
    fn unicode_survives() {
        let raw = encode("олена", "привіт 👋").unwrap();
        let record = parse(&raw).unwrap();
        assert_eq!(record.username(), "олена");
        assert_eq!(record.message(), "привіт 👋");
    }
}
