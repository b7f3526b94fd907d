//! Write path: validate, normalize and upsert one message.

use std::sync::Arc;

use shardtalk_core::{NewMessage, ShardTalkError};
use storage::{MessageRecord, StorageError, UpsertOutcome};
use tracing::{info, instrument, warn};

use crate::state::StoreHandle;

/// What a save did to the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub message_id: i64,
    pub inserted: bool,
    pub updated: bool,
}

impl SaveOutcome {
    fn new(message_id: i64, outcome: UpsertOutcome) -> Self {
        Self {
            message_id,
            inserted: outcome.inserted(),
            updated: outcome.updated(),
        }
    }
}

pub struct IngestionService {
    store: Arc<StoreHandle>,
}

impl IngestionService {
    pub fn new(store: Arc<StoreHandle>) -> Self {
        Self { store }
    }

    /// Upserts `message` keyed by `messageId`.
    ///
    /// Malformed input is rejected before the store is touched. An unreachable store is
    /// [`ShardTalkError::Unavailable`]. A uniqueness conflict is a lost race with another
    /// writer and is retried once before it is surfaced as [`ShardTalkError::Conflict`].
    #[instrument(skip(self, message), fields(message_id = ?message.message_id))]
    pub async fn save(&self, message: &NewMessage) -> Result<SaveOutcome, ShardTalkError> {
        let validated = message.validate()?;
        let record = MessageRecord::from_submission(validated);

        let outcome = match self.upsert(&record).await {
            Err(e) if e.is_conflict() => {
                warn!(message_id = record.message_id, error = %e, "Upsert raced another writer, retrying");
                self.upsert(&record).await?
            }
            other => other?,
        };

        info!(
            message_id = record.message_id,
            sender = %record.sender,
            ?outcome,
            "Message saved"
        );
        Ok(SaveOutcome::new(record.message_id, outcome))
    }

    async fn upsert(&self, record: &MessageRecord) -> Result<UpsertOutcome, StorageError> {
        let store = self.store.get().await?;
        store.upsert(record).await
    }
}
