//! Shared application state: a lazily opened, pooled store handle.

use std::sync::Arc;

use storage::{MessageRepository, MessageStore, StorageError};
use tokio::sync::OnceCell;
use tracing::info;

use crate::services::{IngestionService, QueryService};

/// Opens the store on first use and hands out the shared pool afterwards.
///
/// [`StoreHandle::close`] is the explicit teardown hook for shutdown and tests.
pub struct StoreHandle {
    database_url: Option<String>,
    cell: OnceCell<Arc<dyn MessageStore>>,
}

impl StoreHandle {
    /// Store opened from `database_url` on the first request.
    pub fn lazy(database_url: impl Into<String>) -> Self {
        Self {
            database_url: Some(database_url.into()),
            cell: OnceCell::new(),
        }
    }

    /// Wraps an already opened store.
    pub fn with_store(store: Arc<dyn MessageStore>) -> Self {
        Self {
            database_url: None,
            cell: OnceCell::new_with(Some(store)),
        }
    }

    pub async fn get(&self) -> Result<Arc<dyn MessageStore>, StorageError> {
        let store = self
            .cell
            .get_or_try_init(|| async {
                let url = self
                    .database_url
                    .as_deref()
                    .ok_or_else(|| StorageError::Unavailable("no database configured".to_string()))?;
                info!("Opening message store");
                let repo = MessageRepository::new(url).await?;
                Ok::<_, StorageError>(Arc::new(repo) as Arc<dyn MessageStore>)
            })
            .await?;
        Ok(store.clone())
    }

    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }

    /// Closes the pool if it was ever opened.
    pub async fn close(&self) {
        if let Some(store) = self.cell.get() {
            store.close().await;
        }
    }
}

/// State injected into every handler as `State<Arc<AppState>>`.
pub struct AppState {
    pub store: Arc<StoreHandle>,
    pub query: QueryService,
    pub ingest: IngestionService,
}

impl AppState {
    pub fn new(store: StoreHandle) -> Self {
        let store = Arc::new(store);
        Self {
            query: QueryService::new(store.clone()),
            ingest: IngestionService::new(store.clone()),
            store,
        }
    }
}
