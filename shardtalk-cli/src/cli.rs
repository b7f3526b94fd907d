//! CLI parser and config loading.

use std::env;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reconciler::{SyncConfig, SyncMode, SyncSettings, DEFAULT_BATCH_SIZE};
use shardtalk_core::Address;

#[derive(Parser)]
#[command(name = "shardtalk")]
#[command(about = "ShardTalk: serve the message API, sync from the ledger, query senders", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (config from env; --bind overrides BIND_ADDR).
    Serve {
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Mirror the on-chain message log into the store; ledger and DB from env.
    Sync {
        /// Overrides SYNC_BATCH_SIZE.
        #[arg(short, long)]
        batch_size: Option<u64>,
        /// Resume from the stored checkpoint instead of rescanning from 0.
        #[arg(long)]
        incremental: bool,
    },
    /// Message count for a sender, through the API at SHARDTALK_API_URL.
    Count { address: String },
    /// One page of a sender's messages, newest first, through the API at SHARDTALK_API_URL.
    List {
        address: String,
        #[arg(short, long, default_value = "1")]
        page: i64,
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}

/// Builds [`SyncSettings`] from env: LEDGER_RPC_URL, CONTRACT_ADDRESS, DATABASE_URL,
/// SYNC_BATCH_SIZE, SYNC_INCREMENTAL. CLI flags win over env.
pub fn load_sync_settings(batch_size: Option<u64>, incremental: bool) -> Result<SyncSettings> {
    let rpc_url = env::var("LEDGER_RPC_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .context("LEDGER_RPC_URL is required for sync. Set it in .env or environment.")?;
    let contract_address = env::var("CONTRACT_ADDRESS")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .context("CONTRACT_ADDRESS is required for sync. Set it in .env or environment.")?;
    Address::parse(&contract_address).context("CONTRACT_ADDRESS is not a valid address")?;

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./shardtalk.db".to_string());

    let batch_size = match batch_size {
        Some(n) => n,
        None => match env::var("SYNC_BATCH_SIZE") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("SYNC_BATCH_SIZE is not a number: {}", raw))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        },
    };
    if batch_size == 0 {
        anyhow::bail!("Batch size must be at least 1");
    }

    let incremental = incremental
        || matches!(
            env::var("SYNC_INCREMENTAL").as_deref(),
            Ok("true") | Ok("1")
        );

    Ok(SyncSettings {
        rpc_url,
        contract_address,
        database_url,
        sync: SyncConfig {
            batch_size,
            mode: if incremental {
                SyncMode::Incremental
            } else {
                SyncMode::Full
            },
            ..SyncConfig::default()
        },
    })
}
