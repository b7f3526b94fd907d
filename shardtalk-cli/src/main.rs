//! shardtalk CLI: serve the API, sync from the ledger, query a sender. Config from env and optional CLI args.

use anyhow::{Context, Result};
use clap::Parser;
use reconciler::run_sync;
use resilient_client::{ClientConfig, ShardTalkClient};
use shardtalk_api::{run_server, ApiConfig};
use shardtalk_cli::{load_sync_settings, Cli, Commands};
use shardtalk_core::{init_cli_tracing, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let config = ApiConfig::load(bind)?;
            init_tracing(&config.log_file)?;
            run_server(config).await
        }
        Commands::Sync {
            batch_size,
            incremental,
        } => handle_sync(batch_size, incremental).await,
        Commands::Count { address } => handle_count(&address).await,
        Commands::List {
            address,
            page,
            limit,
        } => handle_list(&address, page, limit).await,
    }
}

async fn handle_sync(batch_size: Option<u64>, incremental: bool) -> Result<()> {
    init_cli_tracing();

    let settings = load_sync_settings(batch_size, incremental)
        .context("Load sync config from .env (LEDGER_RPC_URL, CONTRACT_ADDRESS, DATABASE_URL)")?;
    println!("Syncing messages from contract {}...", settings.contract_address);

    let report = run_sync(settings).await?;

    println!(
        "Total: {}, Inserted: {}, Updated: {}, Unchanged: {}, Senders: {}, Batches: {}, Time: {}ms",
        report.total,
        report.inserted,
        report.updated,
        report.unchanged,
        report.unique_senders,
        report.batches,
        report.elapsed_ms
    );
    if report.start_offset > 0 {
        println!(
            "Resumed at offset {}, next offset {}",
            report.start_offset, report.next_offset
        );
    }

    Ok(())
}

fn client() -> Result<ShardTalkClient> {
    let config = ClientConfig::load().context("Load client config (SHARDTALK_API_URL)")?;
    Ok(ShardTalkClient::new(config)?)
}

async fn handle_count(address: &str) -> Result<()> {
    init_cli_tracing();

    let response = client()?.message_count(address).await?;
    if response.is_degraded() {
        eprintln!(
            "Warning: server could not read storage ({}); count may be wrong.",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("{}: {} message(s)", response.address, response.message_count);

    Ok(())
}

async fn handle_list(address: &str, page: i64, limit: i64) -> Result<()> {
    init_cli_tracing();

    let response = client()?.list_messages(address, page, limit).await?;
    if response.is_degraded() {
        eprintln!(
            "Warning: server could not read storage ({}); list may be incomplete.",
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    let p = response.pagination;
    if response.messages.is_empty() {
        println!("No messages for {} (page {} of {}).", response.address, p.page, p.total_pages);
        return Ok(());
    }

    const CONTENT_PREVIEW_LEN: usize = 80;
    println!(
        "Page {} of {} ({} total) for {}:\n",
        p.page, p.total_pages, p.total, response.address
    );
    println!("{:<10} {:<20} {}", "id", "timestamp", "content_preview");
    println!("{}", "-".repeat(100));

    for m in &response.messages {
        let preview: String = m.content.chars().take(CONTENT_PREVIEW_LEN).collect();
        let preview = preview.replace('\n', " ");
        let when = chrono::DateTime::from_timestamp(m.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| m.timestamp.to_string());
        println!("{:<10} {:<20} {}", m.message_id, when, preview);
    }

    Ok(())
}
