//! Server bootstrap and graceful shutdown.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::config::ApiConfig;
use crate::routes::build_router;
use crate::state::{AppState, StoreHandle};

/// Binds `config.bind_addr` and serves until Ctrl-C.
pub async fn run_server(config: ApiConfig) -> Result<()> {
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let state = Arc::new(AppState::new(StoreHandle::lazy(config.database_url.clone())));
    let cors = cors_layer(config.cors_allow_origin.as_deref())?;

    info!(addr = %config.bind_addr, "ShardTalk API listening");
    serve(listener, state, cors, shutdown_signal()).await
}

/// Serves on `listener` until `shutdown` resolves, then closes the store.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    cors: CorsLayer,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state.clone()).layer(cors);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server failed");

    state.store.close().await;
    info!("ShardTalk API stopped");
    result
}

/// Any origin when `origin` is unset, otherwise exactly `origin`.
pub fn cors_layer(origin: Option<&str>) -> Result<CorsLayer> {
    let allow_origin = match origin {
        Some(origin) => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {}", origin))?,
        ),
        None => AllowOrigin::from(Any),
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
