//! # Ledger client
//!
//! Read-only access to the message contract: total count and contiguous ranges of messages.
//! [`RpcChainReader`] talks JSON-RPC `eth_call` to a node; [`InMemoryLedger`] is an
//! append-only stand-in used by tests and local runs.

mod abi;
mod error;
mod memory;
mod rpc;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use rpc::RpcChainReader;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message as stored in the contract's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMessage {
    pub message_id: u64,
    /// `0x`-prefixed lowercase hex.
    pub sender: String,
    pub content: String,
    /// Seconds since epoch (block time of the write).
    pub timestamp: u64,
}

/// Read side of the ledger. Reads are idempotent and have no side effects.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn total_message_count(&self) -> Result<u64, LedgerError>;
    /// Up to `count` messages starting at position `start`, in ledger order.
    async fn get_messages(&self, start: u64, count: u64) -> Result<Vec<LedgerMessage>, LedgerError>;
}
