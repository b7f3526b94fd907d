//! JSON-RPC chain reader: `eth_call` against the message contract at the `latest` block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::abi::{getMessagesCall, getTotalMessageCountCall, to_u64};
use crate::error::LedgerError;
use crate::{ChainReader, LedgerMessage};

#[derive(Serialize)]
struct CallRequest {
    to: Address,
    data: Bytes,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (&'a CallRequest, &'static str),
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Bytes>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Reads the message contract through a node's JSON-RPC endpoint.
pub struct RpcChainReader {
    http: reqwest::Client,
    rpc_url: String,
    contract: Address,
    next_id: AtomicU64,
}

impl RpcChainReader {
    /// `contract` must be a `0x`-prefixed 20-byte hex address.
    pub fn new(rpc_url: impl Into<String>, contract: &str) -> Result<Self, LedgerError> {
        let contract: Address = contract
            .parse()
            .map_err(|_| LedgerError::InvalidContract(contract.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            rpc_url: rpc_url.into(),
            contract,
            next_id: AtomicU64::new(1),
        })
    }

    async fn eth_call(&self, data: Vec<u8>) -> Result<Bytes, LedgerError> {
        let call = CallRequest {
            to: self.contract,
            data: data.into(),
        };
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: "eth_call",
            params: (&call, "latest"),
        };

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| LedgerError::Decode("response has neither result nor error".to_string()))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    #[instrument(skip(self), fields(contract = %self.contract))]
    async fn total_message_count(&self) -> Result<u64, LedgerError> {
        let output = self
            .eth_call(getTotalMessageCountCall {}.abi_encode())
            .await?;
        let decoded = getTotalMessageCountCall::abi_decode_returns(&output, true)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        let total = to_u64(decoded._0, "totalMessageCount")?;
        debug!(total, "Ledger message count");
        Ok(total)
    }

    #[instrument(skip(self), fields(contract = %self.contract))]
    async fn get_messages(&self, start: u64, count: u64) -> Result<Vec<LedgerMessage>, LedgerError> {
        let call = getMessagesCall {
            start: U256::from(start),
            count: U256::from(count),
        };
        let output = self.eth_call(call.abi_encode()).await?;
        let decoded = getMessagesCall::abi_decode_returns(&output, true)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        let messages = decoded
            ._0
            .into_iter()
            .map(LedgerMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(fetched = messages.len(), "Fetched ledger messages");
        Ok(messages)
    }
}
