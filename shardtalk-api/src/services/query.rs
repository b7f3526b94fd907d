//! Read path: count and paginated list by sender.
//!
//! Storage failures are answered with an empty/zero value annotated with the failure, so
//! pollers of this path are not pushed into retry storms. Validation failures are still errors.

use std::sync::Arc;

use shardtalk_core::{Address, MessageView, PageRequest, Pagination, ValidationError};
use storage::StorageError;
use tracing::{instrument, warn};

use crate::state::StoreHandle;

/// A read result; `failure` is set when `value` is a safe default standing in for a storage error.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<T> {
    pub value: T,
    pub failure: Option<String>,
}

impl<T> QueryOutcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            failure: None,
        }
    }

    pub fn degraded(value: T, failure: impl Into<String>) -> Self {
        Self {
            value,
            failure: Some(failure.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// One page of a sender's messages.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePage {
    pub address: Address,
    pub messages: Vec<MessageView>,
    pub pagination: Pagination,
}

pub struct QueryService {
    store: Arc<StoreHandle>,
}

impl QueryService {
    pub fn new(store: Arc<StoreHandle>) -> Self {
        Self { store }
    }

    /// Number of stored messages from `sender` (any case). Zero for an unknown address.
    #[instrument(skip(self))]
    pub async fn count(&self, sender: &str) -> Result<QueryOutcome<i64>, ValidationError> {
        let address = Address::parse(sender)?;

        match self.count_stored(&address).await {
            Ok(count) => Ok(QueryOutcome::ok(count)),
            Err(e) => {
                warn!(address = %address, error = %e, "Count failed, answering zero");
                Ok(QueryOutcome::degraded(0, e.to_string()))
            }
        }
    }

    /// Page `page` of `sender`'s messages, most recent `timestamp` first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        sender: &str,
        page: i64,
        limit: i64,
    ) -> Result<QueryOutcome<MessagePage>, ValidationError> {
        let address = Address::parse(sender)?;
        let request = PageRequest::new(page, limit)?;

        match self.list_stored(&address, &request).await {
            Ok((total, records)) => Ok(QueryOutcome::ok(MessagePage {
                pagination: Pagination::new(&request, total),
                messages: records.into_iter().map(MessageView::from).collect(),
                address,
            })),
            Err(e) => {
                warn!(address = %address, error = %e, "List failed, answering empty page");
                Ok(QueryOutcome::degraded(
                    MessagePage {
                        pagination: Pagination::new(&request, 0),
                        messages: Vec::new(),
                        address,
                    },
                    e.to_string(),
                ))
            }
        }
    }

    async fn count_stored(&self, address: &Address) -> Result<i64, StorageError> {
        let store = self.store.get().await?;
        store.count_by_sender(address).await
    }

    async fn list_stored(
        &self,
        address: &Address,
        request: &PageRequest,
    ) -> Result<(i64, Vec<storage::MessageRecord>), StorageError> {
        let store = self.store.get().await?;
        let total = store.count_by_sender(address).await?;
        let records = store.list_by_sender(address, request).await?;
        Ok((total, records))
    }
}
