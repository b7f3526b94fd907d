//! Sync configuration and report.
//!
//! Defines [`SyncMode`], [`SyncConfig`], [`SyncSettings`] (everything a CLI run needs) and [`SyncReport`].

use serde::{Deserialize, Serialize};

/// Reference batch size for ledger range reads.
pub const DEFAULT_BATCH_SIZE: u64 = 50;

/// Checkpoint key used when none is configured.
pub const DEFAULT_CHECKPOINT_KEY: &str = "ledger-messages";

/// Where a run starts reading the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SyncMode {
    /// Rescan from offset 0 on every run.
    #[default]
    Full,
    /// Resume from the stored high-water-mark.
    Incremental,
}

/// Reconciler tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub batch_size: u64,
    pub mode: SyncMode,
    pub checkpoint_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            mode: SyncMode::Full,
            checkpoint_key: DEFAULT_CHECKPOINT_KEY.to_string(),
        }
    }
}

/// Connection settings plus tuning for a standalone sync run. Built from env by the CLI.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub rpc_url: String,
    pub contract_address: String,
    pub database_url: String,
    pub sync: SyncConfig,
}

/// Outcome of one reconciler run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Ledger message count at the start of the run.
    pub total: u64,
    pub start_offset: u64,
    /// Offset after the last committed batch.
    pub next_offset: u64,
    pub batches: u64,
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub unique_senders: i64,
    pub elapsed_ms: u64,
}
