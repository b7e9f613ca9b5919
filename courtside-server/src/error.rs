//! Server error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courtside::FailureKind;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::ConfigError;

/// Startup and CLI failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The library reported an error.
    #[error(transparent)]
    Courtside(#[from] courtside::Error),

    /// Binding or serving failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// A failed team listing, rendered as an HTTP error.
///
/// The status is derived from the failure kind; the body is
/// `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] courtside::Error);

impl ApiError {
    /// Failure classification of the wrapped error.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.0.kind()
    }

    /// HTTP status for this failure.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self.kind() {
            FailureKind::UpstreamRateLimited => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::UpstreamUnavailable | FailureKind::SchemaParse => StatusCode::BAD_GATEWAY,
            FailureKind::UpstreamAuth | FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        error!(kind = %kind, status = status.as_u16(), error = %self.0, "request failed");

        let body = Json(json!({
            "error": {
                "code": kind.as_str(),
                "message": self.0.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
