//! # Reconciler
//!
//! Brings the `messages` store into agreement with the ledger. Safe to re-run at any time:
//! every write is an upsert keyed on `message_id`, so a repeated run reports already-synced
//! records as unchanged.

mod config;
mod converter;
mod error;


pub use config::{
    SyncConfig, SyncMode, SyncReport, SyncSettings, DEFAULT_BATCH_SIZE, DEFAULT_CHECKPOINT_KEY,
};
pub use error::SyncError;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use ledger_client::{ChainReader, RpcChainReader};
use storage::{BatchOutcome, MessageRepository, MessageStore};
use tracing::{info, instrument, warn};

use converter::convert;

/// Drives a [`ChainReader`] in fixed-size batches and upserts each batch into a [`MessageStore`].
pub struct Reconciler {
    reader: Arc<dyn ChainReader>,
    store: Arc<dyn MessageStore>,
    config: SyncConfig,
}

impl Reconciler {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        store: Arc<dyn MessageStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            reader,
            store,
            config,
        }
    }

    /// Runs one sync pass.
    ///
    /// # Flow
    ///
    /// 1. Read the ledger total `N`; stop when it is 0.
    /// 2. Pick the start offset: 0 in full mode, the stored checkpoint (clamped to `N`) in incremental mode.
    /// 3. For each batch in ascending offset order: read, convert, upsert in one transaction.
    /// 4. Save the checkpoint (after every batch in incremental mode, at the end in full mode).
    /// 5. Count distinct senders over the final state.
    ///
    /// Any ledger or storage failure aborts the run; committed batches stay committed.
    #[instrument(skip(self), fields(mode = ?self.config.mode, batch_size = self.config.batch_size))]
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        if self.config.batch_size == 0 {
            return Err(SyncError::InvalidConfig("batch_size must be at least 1".to_string()));
        }
        let started = Instant::now();

        let total = self.reader.total_message_count().await?;
        info!(total, "Ledger message count");

        if total == 0 {
            info!("No messages to sync");
            return Ok(SyncReport {
                elapsed_ms: started.elapsed().as_millis() as u64,
                ..SyncReport::default()
            });
        }

        let start_offset = match self.config.mode {
            SyncMode::Full => 0,
            SyncMode::Incremental => self
                .store
                .load_checkpoint(&self.config.checkpoint_key)
                .await?
                .unwrap_or(0)
                .min(total),
        };

        let mut counts = BatchOutcome::default();
        let mut batches = 0;
        let mut offset = start_offset;

        while offset < total {
            let count = self.config.batch_size.min(total - offset);
            info!(offset, count, "Syncing batch");

            let fetched = self.reader.get_messages(offset, count).await?;
            if fetched.is_empty() {
                warn!(offset, "Ledger returned no records for a non-empty range; stopping");
                break;
            }

            let records = fetched.iter().map(convert).collect::<Result<Vec<_>, _>>()?;
            let batch = self.store.upsert_batch(&records).await?;
            counts.merge(&batch);
            batches += 1;
            offset += fetched.len() as u64;

            info!(
                inserted = batch.inserted,
                updated = batch.updated,
                unchanged = batch.unchanged,
                "Progress: {}/{} messages synced",
                offset,
                total
            );

            if self.config.mode == SyncMode::Incremental {
                self.store
                    .save_checkpoint(&self.config.checkpoint_key, offset)
                    .await?;
            }

            if (fetched.len() as u64) < count {
                warn!(
                    offset,
                    requested = count,
                    received = fetched.len(),
                    "Ledger returned a short batch; stopping"
                );
                break;
            }
        }

        if self.config.mode == SyncMode::Full {
            self.store
                .save_checkpoint(&self.config.checkpoint_key, offset)
                .await?;
        }

        let unique_senders = self.store.count_distinct_senders().await?;
        let report = SyncReport {
            total,
            start_offset,
            next_offset: offset,
            batches,
            inserted: counts.inserted,
            updated: counts.updated,
            unchanged: counts.unchanged,
            unique_senders,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            total = report.total,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            unique_senders = report.unique_senders,
            elapsed_ms = report.elapsed_ms,
            "Sync completed"
        );
        Ok(report)
    }
}

/// Opens the store and the RPC reader from `settings` and runs one sync pass.
pub async fn run_sync(settings: SyncSettings) -> anyhow::Result<SyncReport> {
    info!("Connecting to database: {}", settings.database_url);
    let store = MessageRepository::new(&settings.database_url)
        .await
        .context("Open message store (check DATABASE_URL)")?;

    info!(
        rpc_url = %settings.rpc_url,
        contract = %settings.contract_address,
        "Connecting to ledger"
    );
    let reader = RpcChainReader::new(settings.rpc_url.clone(), &settings.contract_address)
        .context("Create ledger reader (check LEDGER_RPC_URL and CONTRACT_ADDRESS)")?;

    let store = Arc::new(store);
    let reconciler = Reconciler::new(Arc::new(reader), store.clone(), settings.sync);
    let result = reconciler.run().await;
    store.close().await;

    Ok(result?)
}
