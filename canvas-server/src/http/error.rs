//! API error types with IntoResponse
//!
//! Errors are converted to JSON `{message, error?}` bodies with the status
//! code for their class. There are no machine-readable error codes.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::connection::ConnectionError;
use crate::db::StoreError;
use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Request input failed validation (400)
    Validation(ValidationError),

    /// Request body over the configured limit (413)
    PayloadTooLarge { reason: String },

    /// Upsert rejected by the store (400)
    WriteRejected(StoreError),

    /// No drawing for the requested owner and name (404)
    NotFound,

    /// Unexpected store failure on a read (500, logged)
    Store {
        context: &'static str,
        source: StoreError,
    },

    /// No store connection could be obtained (500, logged)
    Connection(ConnectionError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn store(context: &'static str, source: StoreError) -> Self {
        Self::Store { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::WriteRejected(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store { .. } | Self::Connection(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation(e) => json!({
                "message": "Invalid canvas",
                "error": e.to_string()
            }),
            Self::PayloadTooLarge { reason } => json!({
                "message": "Canvas too large",
                "error": reason
            }),
            Self::WriteRejected(e) => {
                tracing::warn!("Canvas write rejected: {}", e);
                json!({
                    "message": "Failed to save canvas",
                    "error": e.to_string()
                })
            }
            Self::NotFound => json!({
                "message": "Canvas not found"
            }),
            Self::Store { context, source } => {
                tracing::error!("{}: {}", context, source);
                json!({
                    "message": context,
                    "error": source.to_string()
                })
            }
            Self::Connection(e) => {
                tracing::error!("Connection error: {}", e);
                json!({
                    "message": "Database connection failed",
                    "error": e.to_string()
                })
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                json!({
                    "message": "an internal error occurred"
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Oversized bodies keep their 413; every other body failure is a 400.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let reason = rejection.body_text();
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge { reason }
        } else {
            Self::Validation(ValidationError::MalformedBody { reason })
        }
    }
}

impl From<ConnectionError> for ApiError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}
