//! API error types and responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found
    NotFound(String),
    /// Internal server error
    InternalError(String),
    /// Bad request
    BadRequest(String),
    /// Webhook signature failed verification
    InvalidSignature,
    /// Webhook body could not be parsed
    MalformedPayload(String),
}

/// Error response body
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::InvalidSignature => (StatusCode::UNAUTHORIZED, "invalid_signature", "webhook signature verification failed".to_string()),
            ApiError::MalformedPayload(msg) => (StatusCode::BAD_REQUEST, "malformed_payload", msg),
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<crate::webhook::WebhookRejection> for ApiError {
    fn from(err: crate::webhook::WebhookRejection) -> Self {
        match err {
            crate::webhook::WebhookRejection::InvalidSignature => ApiError::InvalidSignature,
            crate::webhook::WebhookRejection::MalformedPayload(msg) => ApiError::MalformedPayload(msg),
        }
    }
}
