//! # Resilient client
//!
//! Protects callers (and the backend) from retry storms against a degraded destination.
//!
//! - [`CircuitBreaker`]: per-destination `Closed → Open → half-open probe` state machine
//! - [`RetryPolicy`]: bounded exponential back-off, applied on top of the breaker
//! - [`ShardTalkClient`]: typed client for the ShardTalk HTTP surface

mod breaker;
mod client;
mod config;
mod error;
mod retry;

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitState, Permit};
pub use client::ShardTalkClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use retry::{RetryError, RetryPolicy};
