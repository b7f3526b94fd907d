//! # shardtalk-core
//!
//! Shared types for ShardTalk: validated [`Address`], message submission and wire shapes,
//! pagination, the error taxonomy and tracing initialization. Used by storage, the API
//! server, the reconciler and the resilient client.

pub mod api;
pub mod error;
pub mod logger;
pub mod types;

pub use api::{
    ErrorBody, HealthResponse, MessageCountResponse, MessageListResponse, MessageView,
    SaveMessageResponse, TotalMessagesResponse,
};
pub use error::{Result, ShardTalkError, ValidationError};
pub use logger::{init_cli_tracing, init_tracing};
pub use types::{
    Address, NewMessage, PageRequest, Pagination, ValidatedMessage, MAX_PAGE_LIMIT,
};
