//! HTTP routes.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use shardtalk_core::{
    HealthResponse, MessageCountResponse, MessageListResponse, NewMessage, SaveMessageResponse,
    TotalMessagesResponse, ValidationError,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;

/// Query string of `GET /messages`. Kept as raw strings so bad numbers become validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    pub address: Option<String>,
    pub count: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl MessagesQuery {
    fn wants_count(&self) -> bool {
        matches!(self.count.as_deref(), Some("true") | Some("1"))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/messages", get(list_messages_handler).post(save_message_handler))
        .route("/totalmsg/{address}", get(total_messages_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn list_messages_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<MessagesQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let address = query
        .address
        .as_deref()
        .ok_or(ValidationError::MissingField("address"))?;

    if query.wants_count() {
        let outcome = state.query.count(address).await?;
        let degraded = outcome.is_degraded();
        return Ok(Json(MessageCountResponse {
            address: address.to_lowercase(),
            message_count: outcome.value,
            success: degraded.then_some(false),
            error: outcome.failure,
        })
        .into_response());
    }

    let page = parse_number(query.page.as_deref(), DEFAULT_PAGE, ValidationError::InvalidPage)?;
    let limit = parse_number(query.limit.as_deref(), DEFAULT_LIMIT, ValidationError::InvalidLimit)?;

    let outcome = state.query.list(address, page, limit).await?;
    let degraded = outcome.is_degraded();
    let page = outcome.value;
    Ok(Json(MessageListResponse {
        address: page.address.into_string(),
        messages: page.messages,
        pagination: page.pagination,
        success: degraded.then_some(false),
        error: outcome.failure,
    })
    .into_response())
}

async fn save_message_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMessage>, JsonRejection>,
) -> Result<Json<SaveMessageResponse>, ApiError> {
    let Json(message) = payload.map_err(|e| {
        warn!(error = %e.body_text(), "Rejected message body");
        ApiError::BadRequest(e.body_text())
    })?;

    let saved = state.ingest.save(&message).await?;
    Ok(Json(SaveMessageResponse {
        success: true,
        message_id: Some(saved.message_id),
        inserted: saved.inserted,
        updated: saved.updated,
        error: None,
    }))
}

async fn total_messages_handler(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = state.query.count(&address).await?;
    let body = TotalMessagesResponse {
        success: !outcome.is_degraded(),
        address: address.to_lowercase(),
        total_messages: outcome.value,
        error: outcome.failure,
    };
    Ok(([(CACHE_CONTROL, "no-store")], Json(body)).into_response())
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage = match state.store.get().await {
        Ok(store) => match store.count_all().await {
            Ok(_) => "ok",
            Err(_) => "unavailable",
        },
        Err(_) => "unavailable",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage.to_string(),
    })
}

fn parse_number(
    raw: Option<&str>,
    default: i64,
    invalid: fn(String) -> ValidationError,
) -> Result<i64, ValidationError> {
    match raw {
        None => Ok(default),
        Some(s) if s.trim().is_empty() => Ok(default),
        Some(s) => s.trim().parse::<i64>().map_err(|_| invalid(s.to_string())),
    }
}
