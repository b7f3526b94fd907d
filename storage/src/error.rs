//! Storage error types.
//!
//! Used by repository implementations and callers of storage APIs. `sqlx` errors are
//! classified so callers can tell an unreachable store from a write race.

use shardtalk_core::ShardTalkError;
use thiserror::Error;

/// Errors that can occur when using storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),
    /// The store could not be reached (pool closed or timed out, IO failure, locked database).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    /// Uniqueness violation; on the upsert path this is a race between writers.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // SQLITE_CANTOPEN, SQLITE_BUSY, SQLITE_LOCKED (and their extended codes)
                Some(code) if is_unavailable_code(code) => Self::Unavailable(err.to_string()),
                _ => Self::Database(err.to_string()),
            },
            sqlx::Error::RowNotFound => Self::NotFound(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

fn is_unavailable_code(code: &str) -> bool {
    match code.parse::<i32>() {
        Ok(c) => matches!(c & 0xff, 5 | 6 | 14),
        Err(_) => false,
    }
}

impl From<StorageError> for ShardTalkError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => ShardTalkError::Unavailable(msg),
            StorageError::Conflict(msg) => ShardTalkError::Conflict(msg),
            StorageError::Database(msg) | StorageError::NotFound(msg) => {
                ShardTalkError::Internal(msg)
            }
        }
    }
}
