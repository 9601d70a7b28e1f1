//! HTTP error mapping
//!
//! Every handler error is rendered as `{"error": {"code", "message"}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed caller identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// capo-common error, mapped by kind
    #[error(transparent)]
    Common(#[from] capo_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use capo_common::Error as E;

        let (status, code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Common(err) => match err {
                E::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", err.to_string()),
                E::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string()),
                E::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
                E::Store(_) => {
                    error!("Store failure: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR", err.to_string())
                }
                E::Io(_) | E::Serialization(_) | E::Config(_) => {
                    error!("Internal failure: {}", err);
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
                }
            },
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (capo_common::Error::validation_at(2, "bad").into(), StatusCode::BAD_REQUEST),
            (capo_common::Error::NotFound("song".into()).into(), StatusCode::NOT_FOUND),
            (capo_common::Error::Forbidden("no".into()).into(), StatusCode::FORBIDDEN),
            (capo_common::Error::Config("broken".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
