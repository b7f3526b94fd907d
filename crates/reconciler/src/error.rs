use ledger_client::LedgerError;
use storage::StorageError;
use thiserror::Error;

/// A failed run. Any batch failure aborts the run; re-running is safe because writes are upserts.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid sync config: {0}")]
    InvalidConfig(String),
    #[error("Ledger read failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Storage write failed: {0}")]
    Storage(#[from] StorageError),
    #[error("Ledger record conversion failed: {0}")]
    Conversion(String),
}
