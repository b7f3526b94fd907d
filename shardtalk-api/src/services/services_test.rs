//! Unit tests for the query and ingestion services.
//!
//! A scripted store counts every call so validation can be shown to happen before storage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shardtalk_core::{Address, NewMessage, PageRequest, ShardTalkError, ValidationError};
use storage::{BatchOutcome, MessageRecord, MessageStore, StorageError, UpsertOutcome};

use super::{IngestionService, QueryService};
use crate::state::StoreHandle;

const SENDER: &str = "0x00000000000000000000000000000000000000Ab";

/// Store whose reads fail when `reads_unavailable` and whose upserts pop scripted errors.
#[derive(Default)]
struct ScriptedStore {
    calls: AtomicUsize,
    reads_unavailable: bool,
    upsert_errors: Mutex<VecDeque<StorageError>>,
}

impl ScriptedStore {
    fn unavailable() -> Self {
        Self {
            reads_unavailable: true,
            ..Default::default()
        }
    }

    fn with_upsert_errors(errors: Vec<StorageError>) -> Self {
        Self {
            upsert_errors: Mutex::new(errors.into()),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reads_unavailable {
            return Err(StorageError::Unavailable("pool closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MessageStore for ScriptedStore {
    async fn upsert(&self, _record: &MessageRecord) -> Result<UpsertOutcome, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.upsert_errors.lock().unwrap().pop_front() {
            Some(e) => Err(e),
            None => Ok(UpsertOutcome::Inserted),
        }
    }

    async fn upsert_batch(&self, records: &[MessageRecord]) -> Result<BatchOutcome, StorageError> {
        let mut outcome = BatchOutcome::default();
        for record in records {
            outcome.record(self.upsert(record).await?);
        }
        Ok(outcome)
    }

    async fn count_by_sender(&self, _sender: &Address) -> Result<i64, StorageError> {
        self.read()?;
        Ok(3)
    }

    async fn list_by_sender(
        &self,
        _sender: &Address,
        _page: &PageRequest,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        self.read()?;
        Ok(Vec::new())
    }

    async fn count_distinct_senders(&self) -> Result<i64, StorageError> {
        self.read()?;
        Ok(0)
    }

    async fn count_all(&self) -> Result<i64, StorageError> {
        self.read()?;
        Ok(0)
    }

    async fn get_by_id(&self, _message_id: i64) -> Result<Option<MessageRecord>, StorageError> {
        self.read()?;
        Ok(None)
    }

    async fn load_checkpoint(&self, _key: &str) -> Result<Option<u64>, StorageError> {
        self.read()?;
        Ok(None)
    }

    async fn save_checkpoint(&self, _key: &str, _next_offset: u64) -> Result<(), StorageError> {
        self.read()
    }
}

fn services(store: Arc<ScriptedStore>) -> (QueryService, IngestionService) {
    let handle = Arc::new(StoreHandle::with_store(store));
    (
        QueryService::new(handle.clone()),
        IngestionService::new(handle),
    )
}

/// **Test:** Malformed sender is rejected by both services without any storage call.
#[tokio::test]
async fn test_invalid_sender_never_reaches_storage() {
    let store = Arc::new(ScriptedStore::default());
    let (query, ingest) = services(store.clone());

    let count = query.count("not-an-address").await;
    assert!(matches!(count, Err(ValidationError::InvalidAddress(_))));

    let list = query.list("not-an-address", 1, 10).await;
    assert!(matches!(list, Err(ValidationError::InvalidAddress(_))));

    let save = ingest
        .save(&NewMessage::new(1, "not-an-address", "hi", 100))
        .await;
    assert!(matches!(save, Err(ShardTalkError::Validation(_))));

    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_out_of_range_pagination_is_rejected() {
    let store = Arc::new(ScriptedStore::default());
    let (query, _) = services(store.clone());

    assert!(matches!(
        query.list(SENDER, 0, 10).await,
        Err(ValidationError::InvalidPage(_))
    ));
    assert!(matches!(
        query.list(SENDER, 1, 101).await,
        Err(ValidationError::InvalidLimit(_))
    ));
    assert!(matches!(
        query.list(SENDER, 1, 0).await,
        Err(ValidationError::InvalidLimit(_))
    ));
    assert_eq!(store.calls(), 0);
}

/// **Test:** Read path answers safe defaults when storage is down.
///
/// **Expected:** count is 0, list is an empty page with `total = 0`, both flagged as degraded.
#[tokio::test]
async fn test_reads_degrade_when_storage_unavailable() {
    let store = Arc::new(ScriptedStore::unavailable());
    let (query, _) = services(store);

    let count = query.count(SENDER).await.unwrap();
    assert_eq!(count.value, 0);
    assert!(count.is_degraded());

    let list = query.list(SENDER, 2, 5).await.unwrap();
    assert!(list.is_degraded());
    assert!(list.value.messages.is_empty());
    assert_eq!(list.value.pagination.page, 2);
    assert_eq!(list.value.pagination.limit, 5);
    assert_eq!(list.value.pagination.total, 0);
    assert_eq!(list.value.pagination.total_pages, 0);
    assert_eq!(list.value.address.as_str(), SENDER.to_lowercase());
}

#[tokio::test]
async fn test_count_healthy_store() {
    let store = Arc::new(ScriptedStore::default());
    let (query, _) = services(store);

    let count = query.count(SENDER).await.unwrap();
    assert_eq!(count.value, 3);
    assert!(!count.is_degraded());
}

#[tokio::test]
async fn test_save_surfaces_unavailable() {
    let store = Arc::new(ScriptedStore::with_upsert_errors(vec![
        StorageError::Unavailable("database is locked".to_string()),
    ]));
    let (_, ingest) = services(store.clone());

    let result = ingest.save(&NewMessage::new(1, SENDER, "gm", 100)).await;

    assert!(matches!(result, Err(ShardTalkError::Unavailable(_))));
    assert_eq!(store.calls(), 1);
}

/// **Test:** A single uniqueness conflict is absorbed by one internal retry.
#[tokio::test]
async fn test_save_retries_conflict_once() {
    let store = Arc::new(ScriptedStore::with_upsert_errors(vec![
        StorageError::Conflict("UNIQUE constraint failed: messages.message_id".to_string()),
    ]));
    let (_, ingest) = services(store.clone());

    let saved = ingest
        .save(&NewMessage::new(9, SENDER, "gm", 100))
        .await
        .unwrap();

    assert_eq!(saved.message_id, 9);
    assert!(saved.inserted);
    assert!(!saved.updated);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_save_surfaces_repeated_conflict() {
    let store = Arc::new(ScriptedStore::with_upsert_errors(vec![
        StorageError::Conflict("race".to_string()),
        StorageError::Conflict("race".to_string()),
    ]));
    let (_, ingest) = services(store.clone());

    let result = ingest.save(&NewMessage::new(9, SENDER, "gm", 100)).await;

    assert!(matches!(result, Err(ShardTalkError::Conflict(_))));
    assert_eq!(store.calls(), 2);
}

/// **Test:** A lazily opened store that cannot be created degrades reads and fails writes.
///
/// **Setup:** Database path inside a directory that does not exist.
#[tokio::test]
async fn test_lazy_store_open_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("shardtalk.db");
    let handle = Arc::new(StoreHandle::lazy(path.to_str().unwrap()));
    let query = QueryService::new(handle.clone());
    let ingest = IngestionService::new(handle.clone());

    let count = query.count(SENDER).await.unwrap();
    assert!(count.is_degraded());
    assert_eq!(count.value, 0);

    let save = ingest.save(&NewMessage::new(1, SENDER, "gm", 100)).await;
    assert!(save.is_err());
    assert!(!handle.is_open());
}

/// **Test:** Save then read through a real SQLite store, with mixed-case input.
#[tokio::test]
async fn test_save_and_count_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shardtalk.db");
    let handle = Arc::new(StoreHandle::lazy(path.to_str().unwrap()));
    let query = QueryService::new(handle.clone());
    let ingest = IngestionService::new(handle.clone());

    let first = ingest
        .save(&NewMessage::new(1, SENDER, "  hello  ", 100))
        .await
        .unwrap();
    assert!(first.inserted);

    let again = ingest
        .save(&NewMessage::new(1, SENDER, "hello", 100))
        .await
        .unwrap();
    assert!(!again.inserted);
    assert!(!again.updated);

    let edited = ingest
        .save(&NewMessage::new(1, SENDER, "hello again", 100))
        .await
        .unwrap();
    assert!(edited.updated);

    let count = query.count(&SENDER.to_uppercase().replacen("0X", "0x", 1)).await.unwrap();
    assert_eq!(count.value, 1);

    let page = query.list(SENDER, 1, 20).await.unwrap();
    assert_eq!(page.value.messages.len(), 1);
    assert_eq!(page.value.messages[0].content, "hello again");
    assert_eq!(page.value.messages[0].sender, SENDER.to_lowercase());

    handle.close().await;
}
