//! In-memory append-only ledger.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::LedgerError;
use crate::{ChainReader, LedgerMessage};

/// Append-only ledger held in memory. `fail_next` makes the next N reads fail with a transport error.
#[derive(Default)]
pub struct InMemoryLedger {
    messages: RwLock<Vec<LedgerMessage>>,
    failures: AtomicUsize,
    reads: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<LedgerMessage>) -> Self {
        Self {
            messages: RwLock::new(messages),
            ..Self::default()
        }
    }

    /// Appends a message; the returned id is its position.
    pub async fn append(&self, sender: &str, content: &str, timestamp: u64) -> u64 {
        let mut messages = self.messages.write().await;
        let message_id = messages.len() as u64;
        messages.push(LedgerMessage {
            message_id,
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp,
        });
        message_id
    }

    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Number of `get_messages` calls served so far (including failed ones).
    pub fn range_reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), LedgerError> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(LedgerError::Transport("injected ledger failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for InMemoryLedger {
    async fn total_message_count(&self) -> Result<u64, LedgerError> {
        self.take_failure()?;
        Ok(self.messages.read().await.len() as u64)
    }

    async fn get_messages(&self, start: u64, count: u64) -> Result<Vec<LedgerMessage>, LedgerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let messages = self.messages.read().await;
        let start = (start as usize).min(messages.len());
        let end = start.saturating_add(count as usize).min(messages.len());
        Ok(messages[start..end].to_vec())
    }
}
