use std::time::Duration;

use shardtalk_core::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The breaker for this destination is open; no request was sent.
    #[error("Circuit open for {destination}")]
    CircuitOpen { destination: String },

    #[error("Request to {destination} timed out after {after:?}")]
    Timeout { destination: String, after: Duration },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Client error {status}: {message}")]
    Client { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// HTTP success, but the body reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// "Never tried" as opposed to "tried and failed".
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// Failures that count against the destination's breaker.
    pub fn is_destination_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Network(_) | Self::Server { .. }
        )
    }
}
