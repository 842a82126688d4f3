//! Message record and the document persisted for it.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Timestamp layout of the `date` document field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// A validated inbound message.
///
/// Only [`crate::message::parse`] constructs records, so both fields are
/// always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    username: String,
    message: String,
}

impl MessageRecord {
    pub(crate) fn new(username: String, message: String) -> Self {
        debug_assert!(!username.is_empty() && !message.is_empty());
        Self { username, message }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attach the persistence timestamp, producing the stored document.
    pub fn stamp(self, received_at: DateTime<Local>) -> MessageDocument {
        MessageDocument {
            received_at,
            username: self.username,
            message: self.message,
        }
    }
}

/// A message record stamped with the time it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDocument {
    received_at: DateTime<Local>,
    username: String,
    message: String,
}

impl MessageDocument {
    pub fn received_at(&self) -> DateTime<Local> {
        self.received_at
    }

    /// `date` field value, `YYYY-MM-DD HH:MM:SS.ffffff`.
    pub fn date(&self) -> String {
        self.received_at.format(DATE_FORMAT).to_string()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Stored shape: `{date, username, message}`.
impl Serialize for MessageDocument {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("MessageDocument", 3)?;
        s.serialize_field("date", &self.date())?;
        s.serialize_field("username", &self.username)?;
        s.serialize_field("message", &self.message)?;
        s.end()
    }
}
