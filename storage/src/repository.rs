use async_trait::async_trait;
use shardtalk_core::{Address, PageRequest};

use crate::error::StorageError;
use crate::models::{BatchOutcome, MessageRecord, UpsertOutcome};

/// Operations over the `messages` collection and sync checkpoints.
///
/// Services take an `Arc<dyn MessageStore>` so the backing store can be swapped in tests.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Inserts or fully overwrites the record keyed by `message_id`.
    async fn upsert(&self, record: &MessageRecord) -> Result<UpsertOutcome, StorageError>;
    /// Upserts every record in one transaction.
    async fn upsert_batch(&self, records: &[MessageRecord]) -> Result<BatchOutcome, StorageError>;
    async fn count_by_sender(&self, sender: &Address) -> Result<i64, StorageError>;
    /// Records for `sender`, most recent `timestamp` first.
    async fn list_by_sender(
        &self,
        sender: &Address,
        page: &PageRequest,
    ) -> Result<Vec<MessageRecord>, StorageError>;
    async fn count_distinct_senders(&self) -> Result<i64, StorageError>;
    async fn count_all(&self) -> Result<i64, StorageError>;
    async fn get_by_id(&self, message_id: i64) -> Result<Option<MessageRecord>, StorageError>;
    /// Next ledger offset to read for the given sync key, if a run has recorded one.
    async fn load_checkpoint(&self, key: &str) -> Result<Option<u64>, StorageError>;
    async fn save_checkpoint(&self, key: &str, next_offset: u64) -> Result<(), StorageError>;
    /// Releases pooled connections.
    async fn close(&self) {}
}
