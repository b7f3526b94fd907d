//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shardtalk_core::{ErrorBody, ShardTalkError, ValidationError};
use thiserror::Error;

/// Failure returned by a handler. Read-path storage failures never get here; they are
/// answered with safe defaults by the query service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Body or query string could not be parsed.
    #[error("{0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ShardTalkError> for ApiError {
    fn from(err: ShardTalkError) -> Self {
        match err {
            ShardTalkError::Validation(e) => Self::Validation(e),
            ShardTalkError::Unavailable(msg) => Self::Unavailable(msg),
            ShardTalkError::Conflict(msg) => Self::Conflict(msg),
            ShardTalkError::Config(msg) | ShardTalkError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let body = match self {
            Self::Validation(_) | Self::BadRequest(_) => ErrorBody::new(message),
            _ => ErrorBody::failed(message),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let invalid = ApiError::from(ValidationError::InvalidAddress("nope".to_string()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ShardTalkError::Unavailable("down".to_string())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ShardTalkError::Conflict("race".to_string())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ShardTalkError::Internal("boom".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_is_not_prefixed() {
        let err = ApiError::from(ValidationError::EmptyContent);
        assert_eq!(err.to_string(), "Message content cannot be empty");
    }
}
