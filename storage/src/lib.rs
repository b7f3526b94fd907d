//! Storage crate: persistence of the `messages` collection and sync checkpoints.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types and sqlx error classification
//! - [`models`] – MessageRecord, UpsertOutcome, BatchOutcome
//! - [`repository`] – MessageStore trait (injected into services)
//! - [`message_repo`] – MessageRepository (SQLite)
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod message_repo;
mod models;
mod repository;
mod sqlite_pool;

#[cfg(test)]
mod message_repo_test;

pub use error::StorageError;
pub use message_repo::MessageRepository;
pub use models::{BatchOutcome, MessageRecord, UpsertOutcome};
pub use repository::MessageStore;
pub use sqlite_pool::SqlitePoolManager;
