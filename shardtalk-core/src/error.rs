use thiserror::Error;

/// Input rejected before any storage or network access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Invalid page: {0} (must be >= 1)")]
    InvalidPage(String),

    #[error("Invalid limit: {0} (must be between 1 and 100)")]
    InvalidLimit(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Message content cannot be empty")]
    EmptyContent,
}

/// Classified failure returned by every ShardTalk entry point.
#[derive(Error, Debug)]
pub enum ShardTalkError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage or ledger could not be reached; the caller may retry later.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShardTalkError {
    /// True for failures a caller should retry (unavailable destination or write race).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, ShardTalkError>;
