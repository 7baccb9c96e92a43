//! API error types and response formatting.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Message returned for any unexpected server-side failure.
pub const GENERIC_ERROR: &str = "There was an error processing your request. Please try again.";

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Untrusted origin or bad request signature.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Malformed, missing, or expired input.
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// Endpoint exists but not for this method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// No such API endpoint.
    #[error("not found")]
    NotFound,

    /// A required secret or credential is missing. The detail is logged,
    /// never sent to the caller.
    #[error("configuration error: {0}")]
    Configuration(&'static str),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Configuration(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Forbidden(msg) | Self::BadRequest(msg) => (*msg).to_string(),
            Self::MethodNotAllowed => "Method not allowed".to_string(),
            Self::NotFound => "API endpoint not found".to_string(),
            Self::Configuration(detail) => {
                tracing::error!(detail = %detail, "server configuration error");
                "Server configuration error".to_string()
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                GENERIC_ERROR.to_string()
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
