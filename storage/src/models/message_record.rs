//! Message record model for persistence.
//!
//! Maps to the `messages` table and is used by MessageRepository.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shardtalk_core::{MessageView, ValidatedMessage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRecord {
    pub message_id: i64,
    /// Lowercase `0x` address.
    pub sender: String,
    pub content: String,
    /// Seconds since epoch, assigned by the ledger. Authoritative for ordering.
    pub timestamp: i64,
    /// `None` keeps whatever hash is already stored.
    pub transaction_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Builds a record from a validated submission, stamped with the current time.
    pub fn from_submission(message: ValidatedMessage) -> Self {
        Self {
            message_id: message.message_id,
            sender: message.sender.into_string(),
            content: message.content,
            timestamp: message.timestamp,
            transaction_hash: message.transaction_hash,
            created_at: Utc::now(),
        }
    }
}

impl From<MessageRecord> for MessageView {
    fn from(record: MessageRecord) -> Self {
        Self {
            message_id: record.message_id,
            sender: record.sender,
            content: record.content,
            timestamp: record.timestamp,
            transaction_hash: record.transaction_hash,
            created_at: record.created_at,
        }
    }
}
