//! # ShardTalk API
//!
//! Query Service and Ingestion Endpoint over the `messages` store, served with axum.
//! The store is opened lazily on first use and injected through [`AppState`].

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use server::{run_server, serve};
pub use services::{IngestionService, QueryOutcome, QueryService, SaveOutcome};
pub use state::{AppState, StoreHandle};
