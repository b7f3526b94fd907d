//! LedgerMessage → MessageRecord conversion.

use chrono::{DateTime, Utc};
use ledger_client::LedgerMessage;
use shardtalk_core::Address;
use storage::MessageRecord;

use crate::error::SyncError;

/// Converts a ledger record into the stored shape.
///
/// - `message_id`, `timestamp`: coerced to `i64`
/// - `sender`: validated and lowercased
/// - `created_at`: derived from `timestamp * 1000` milliseconds
/// - `transaction_hash`: `None`, which keeps any hash recorded by ingestion
pub(crate) fn convert(msg: &LedgerMessage) -> Result<MessageRecord, SyncError> {
    let message_id = i64::try_from(msg.message_id)
        .map_err(|_| SyncError::Conversion(format!("messageId {} out of range", msg.message_id)))?;
    let timestamp = i64::try_from(msg.timestamp)
        .map_err(|_| SyncError::Conversion(format!("timestamp {} out of range", msg.timestamp)))?;
    let sender = Address::parse(&msg.sender)
        .map_err(|e| SyncError::Conversion(format!("message {}: {}", msg.message_id, e)))?;
    let created_at = timestamp
        .checked_mul(1000)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| SyncError::Conversion(format!("timestamp {} not representable", timestamp)))?;

    Ok(MessageRecord {
        message_id,
        sender: sender.into_string(),
        content: msg.content.clone(),
        timestamp,
        transaction_hash: None,
        created_at,
    })
}
