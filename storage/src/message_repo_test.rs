//! Unit tests for MessageRepository.
//!
//! Covers upsert classification, batch counts, checkpoints and close.

use chrono::{TimeZone, Utc};
use shardtalk_core::Address;
use tempfile::TempDir;

use crate::message_repo::MessageRepository;
use crate::models::{MessageRecord, UpsertOutcome};
use crate::repository::MessageStore;

const SENDER: &str = "0x00000000000000000000000000000000000000aa";

async fn test_repo() -> (TempDir, MessageRepository) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("messages.db");
    let repo = MessageRepository::new(path.to_str().unwrap())
        .await
        .expect("Failed to create repository");
    (dir, repo)
}

fn record(message_id: i64, content: &str, timestamp: i64) -> MessageRecord {
    MessageRecord {
        message_id,
        sender: SENDER.to_string(),
        content: content.to_string(),
        timestamp,
        transaction_hash: None,
        created_at: Utc.timestamp_opt(timestamp, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_upsert_classifies_insert_update_unchanged() {
    let (_dir, repo) = test_repo().await;

    let first = repo.upsert(&record(1, "hello", 100)).await.unwrap();
    assert_eq!(first, UpsertOutcome::Inserted);

    let same = repo.upsert(&record(1, "hello", 100)).await.unwrap();
    assert_eq!(same, UpsertOutcome::Unchanged);

    let changed = repo.upsert(&record(1, "hello, edited", 100)).await.unwrap();
    assert_eq!(changed, UpsertOutcome::Updated);

    assert_eq!(repo.count_all().await.unwrap(), 1);
    let stored = repo.get_by_id(1).await.unwrap().unwrap();
    assert_eq!(stored.content, "hello, edited");
}

#[tokio::test]
async fn test_upsert_keeps_existing_transaction_hash() {
    let (_dir, repo) = test_repo().await;

    let mut with_hash = record(5, "gm", 500);
    with_hash.transaction_hash = Some("0xfeed".to_string());
    repo.upsert(&with_hash).await.unwrap();

    // A ledger re-sync carries no hash and must not erase it.
    let outcome = repo.upsert(&record(5, "gm", 500)).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Unchanged);

    let stored = repo.get_by_id(5).await.unwrap().unwrap();
    assert_eq!(stored.transaction_hash.as_deref(), Some("0xfeed"));
}

#[tokio::test]
async fn test_upsert_batch_counts() {
    let (_dir, repo) = test_repo().await;

    repo.upsert(&record(1, "a", 10)).await.unwrap();
    repo.upsert(&record(2, "b", 20)).await.unwrap();

    let batch = repo
        .upsert_batch(&[record(1, "a", 10), record(2, "b2", 20), record(3, "c", 30)])
        .await
        .unwrap();

    assert_eq!(batch.unchanged, 1);
    assert_eq!(batch.updated, 1);
    assert_eq!(batch.inserted, 1);
    assert_eq!(batch.total(), 3);
}

#[tokio::test]
async fn test_upsert_batch_empty() {
    let (_dir, repo) = test_repo().await;
    let batch = repo.upsert_batch(&[]).await.unwrap();
    assert_eq!(batch.total(), 0);
}

#[tokio::test]
async fn test_count_distinct_senders() {
    let (_dir, repo) = test_repo().await;

    repo.upsert(&record(1, "a", 10)).await.unwrap();
    let mut other = record(2, "b", 20);
    other.sender = "0x00000000000000000000000000000000000000bb".to_string();
    repo.upsert(&other).await.unwrap();
    repo.upsert(&record(3, "c", 30)).await.unwrap();

    assert_eq!(repo.count_distinct_senders().await.unwrap(), 2);
    let addr = Address::parse(SENDER).unwrap();
    assert_eq!(repo.count_by_sender(&addr).await.unwrap(), 2);
}

#[tokio::test]
async fn test_checkpoint_roundtrip() {
    let (_dir, repo) = test_repo().await;

    assert_eq!(repo.load_checkpoint("ledger").await.unwrap(), None);
    repo.save_checkpoint("ledger", 50).await.unwrap();
    repo.save_checkpoint("ledger", 120).await.unwrap();
    assert_eq!(repo.load_checkpoint("ledger").await.unwrap(), Some(120));
    assert_eq!(repo.load_checkpoint("other").await.unwrap(), None);
}

#[tokio::test]
async fn test_closed_repository_is_unavailable() {
    let (_dir, repo) = test_repo().await;
    repo.close().await;

    let addr = Address::parse(SENDER).unwrap();
    let err = repo.count_by_sender(&addr).await.unwrap_err();
    assert!(err.is_unavailable(), "unexpected error: {err}");
}
