//! Message repository: persistence and queries for messages.
//!
//! Uses SqlitePoolManager and the models (MessageRecord, UpsertOutcome, BatchOutcome).
//! Every write is an upsert keyed on `message_id`, so re-sync and retried ingestion are idempotent.

use async_trait::async_trait;
use chrono::Utc;
use shardtalk_core::{Address, PageRequest};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqliteConnection};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{BatchOutcome, MessageRecord, UpsertOutcome};
use crate::repository::MessageStore;
use crate::sqlite_pool::SqlitePoolManager;

/// Both write statements lead their transaction with a write, so SQLite takes the write lock
/// up front and waits out the busy timeout instead of failing a read-to-write upgrade.
const INSERT_SQL: &str = r#"
    INSERT INTO messages (message_id, sender, content, timestamp, transaction_hash, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(message_id) DO NOTHING
"#;

/// Content changes are detected on sender/content/timestamp and on a newly supplied hash;
/// `created_at` is bookkeeping and never makes a record "changed" on its own.
const UPDATE_SQL: &str = r#"
    UPDATE messages SET
        sender = ?2,
        content = ?3,
        timestamp = ?4,
        transaction_hash = COALESCE(?5, transaction_hash),
        created_at = ?6
    WHERE message_id = ?1
      AND (sender IS NOT ?2
           OR content IS NOT ?3
           OR timestamp IS NOT ?4
           OR (?5 IS NOT NULL AND transaction_hash IS NOT ?5))
"#;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                message_id INTEGER PRIMARY KEY,
                sender TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                transaction_hash TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages(sender);
            CREATE INDEX IF NOT EXISTS idx_messages_sender_timestamp ON messages(sender, timestamp DESC);
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sync_checkpoints (
                sync_key TEXT PRIMARY KEY,
                next_offset INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        info!("Database tables created successfully");
        Ok(())
    }

    /// Runs one upsert on an open connection (or transaction) and classifies the result.
    async fn upsert_on(
        conn: &mut SqliteConnection,
        record: &MessageRecord,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let inserted = Self::bind_record(sqlx::query::<Sqlite>(INSERT_SQL), record)
            .execute(&mut *conn)
            .await?;
        if inserted.rows_affected() > 0 {
            return Ok(UpsertOutcome::Inserted);
        }

        let updated = Self::bind_record(sqlx::query::<Sqlite>(UPDATE_SQL), record)
            .execute(&mut *conn)
            .await?;
        let outcome = if updated.rows_affected() > 0 {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Unchanged
        };
        Ok(outcome)
    }

    fn bind_record<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        record: &'q MessageRecord,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(record.message_id)
            .bind(&record.sender)
            .bind(&record.content)
            .bind(record.timestamp)
            .bind(&record.transaction_hash)
            .bind(record.created_at)
    }

    pub async fn close(&self) {
        self.pool_manager.close().await;
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn upsert(&self, record: &MessageRecord) -> Result<UpsertOutcome, StorageError> {
        let mut tx = self.pool_manager.pool().begin().await?;
        let outcome = Self::upsert_on(&mut tx, record).await?;
        tx.commit().await?;

        info!(
            message_id = record.message_id,
            sender = %record.sender,
            outcome = ?outcome,
            "Upserted message"
        );
        Ok(outcome)
    }

    async fn upsert_batch(&self, records: &[MessageRecord]) -> Result<BatchOutcome, StorageError> {
        let mut batch = BatchOutcome::default();
        if records.is_empty() {
            return Ok(batch);
        }

        let mut tx = self.pool_manager.pool().begin().await?;
        for record in records {
            batch.record(Self::upsert_on(&mut tx, record).await?);
        }
        tx.commit().await?;

        debug!(
            size = records.len(),
            inserted = batch.inserted,
            updated = batch.updated,
            unchanged = batch.unchanged,
            "Upserted batch"
        );
        Ok(batch)
    }

    async fn count_by_sender(&self, sender: &Address) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE sender = ?")
            .bind(sender.as_str())
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count.0)
    }

    async fn list_by_sender(
        &self,
        sender: &Address,
        page: &PageRequest,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        let messages: Vec<MessageRecord> = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT message_id, sender, content, timestamp, transaction_hash, created_at
            FROM messages
            WHERE sender = ?
            ORDER BY timestamp DESC, message_id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(sender.as_str())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool_manager.pool())
        .await?;

        info!(
            sender = %sender,
            page = page.page(),
            limit = page.limit(),
            "Retrieved {} messages",
            messages.len()
        );
        Ok(messages)
    }

    async fn count_distinct_senders(&self) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(DISTINCT sender) FROM messages")
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count.0)
    }

    async fn count_all(&self) -> Result<i64, StorageError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(count.0)
    }

    async fn get_by_id(&self, message_id: i64) -> Result<Option<MessageRecord>, StorageError> {
        let message = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT message_id, sender, content, timestamp, transaction_hash, created_at
            FROM messages WHERE message_id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(self.pool_manager.pool())
        .await?;

        Ok(message)
    }

    async fn load_checkpoint(&self, key: &str) -> Result<Option<u64>, StorageError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT next_offset FROM sync_checkpoints WHERE sync_key = ?")
                .bind(key)
                .fetch_optional(self.pool_manager.pool())
                .await?;
        Ok(row.map(|(offset,)| offset.max(0) as u64))
    }

    async fn save_checkpoint(&self, key: &str, next_offset: u64) -> Result<(), StorageError> {
        let offset = i64::try_from(next_offset)
            .map_err(|_| StorageError::Database(format!("checkpoint out of range: {}", next_offset)))?;

        sqlx::query(
            r#"
            INSERT INTO sync_checkpoints (sync_key, next_offset, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(sync_key) DO UPDATE SET
                next_offset = excluded.next_offset,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(offset)
        .bind(Utc::now())
        .execute(self.pool_manager.pool())
        .await?;

        debug!(sync_key = key, next_offset, "Saved sync checkpoint");
        Ok(())
    }

    async fn close(&self) {
        MessageRepository::close(self).await;
    }
}
