//! Unified error types for courtside.
//!
//! This module provides the error hierarchy for a structured-output call:
//! - LLM provider errors (authentication, rate limiting, transport, etc.)
//! - Schema parse errors (the model replied, but not in the declared shape)
//! - Configuration and I/O errors
//!
//! [`Error::kind`] folds all of them into the small [`FailureKind`] taxonomy
//! that callers (the HTTP layer, the fallback policy) branch on.

use std::fmt;

/// Result type alias for courtside operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for courtside.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// LLM provider error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model reply could not be mapped into the requested schema.
    #[error("Schema parse error for `{schema}`: {message}")]
    SchemaParse {
        /// Name of the schema the reply was parsed against.
        schema: String,
        /// What went wrong.
        message: String,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a schema parse error.
    #[must_use]
    pub fn schema_parse(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaParse {
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify this error into the upstream failure taxonomy.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Llm(err) => err.failure_kind(),
            Self::SchemaParse { .. } => FailureKind::SchemaParse,
            Self::Config(_) | Self::Json(_) | Self::Io(_) => FailureKind::Internal,
        }
    }
}

/// Coarse failure categories of a structured-output call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Credential missing or rejected by the provider.
    UpstreamAuth,
    /// Provider throttled the request.
    UpstreamRateLimited,
    /// Provider unreachable, timed out, or answered with a 5xx.
    UpstreamUnavailable,
    /// Reply did not conform to the declared schema.
    SchemaParse,
    /// Anything else.
    Internal,
}

impl FailureKind {
    /// Stable identifier used in logs and HTTP error bodies.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamAuth => "UPSTREAM_AUTH",
            Self::UpstreamRateLimited => "UPSTREAM_RATE_LIMITED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::SchemaParse => "SCHEMA_PARSE",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns `true` for transient upstream conditions.
    ///
    /// These are the only failures the optional fallback policy may replace.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamRateLimited | Self::UpstreamUnavailable)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for LLM provider operations.
///
/// Each variant represents a distinct failure mode, enabling callers to
/// pattern-match on specific cases.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// Authentication or authorization failure.
    #[error("[{provider}] {message}")]
    Auth {
        /// Provider name (e.g., "openai").
        provider: String,
        /// Error description.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("[{provider}] Rate limit exceeded. Please retry after some time.")]
    RateLimited {
        /// Provider name.
        provider: String,
    },

    /// Network, timeout, or provider-side unavailability.
    #[error("{0}")]
    Network(String),

    /// The provider's response envelope was not what we expected.
    #[error("Expected {expected}, got {got}")]
    ResponseFormat {
        /// Expected format description.
        expected: String,
        /// Actual format received.
        got: String,
    },

    /// HTTP status error with a body the provider parser did not recognize.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Provider-specific error.
    #[error("[{provider}] {message}")]
    Provider {
        /// Provider name.
        provider: String,
        /// Error description.
        message: String,
        /// Optional error code from the provider.
        code: Option<String>,
    },

    /// Internal error.
    #[error("{0}")]
    Internal(String),
}

impl LlmError {
    /// Create an authentication error.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limit error.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a response format error.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ResponseFormat {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a provider error with an error code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Map this provider error onto the coarse [`FailureKind`] taxonomy.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Auth { .. } => FailureKind::UpstreamAuth,
            Self::RateLimited { .. } => FailureKind::UpstreamRateLimited,
            Self::Network(_) => FailureKind::UpstreamUnavailable,
            Self::HttpStatus { status, .. } if *status >= 500 => FailureKind::UpstreamUnavailable,
            Self::ResponseFormat { .. }
            | Self::HttpStatus { .. }
            | Self::Provider { .. }
            | Self::Internal(_) => FailureKind::Internal,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Llm(err.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod error {
        use super::*;

        #[test]
        fn schema_parse_creates_error() {
            let err = Error::schema_parse("Array_of_Team", "expected array");
            assert!(matches!(err, Error::SchemaParse { .. }));
            assert!(err.to_string().contains("Array_of_Team"));
            assert!(err.to_string().contains("expected array"));
        }

        #[test]
        fn from_llm_error() {
            let err: Error = LlmError::network("timeout").into();
            assert!(matches!(err, Error::Llm(_)));
        }

        #[test]
        fn from_io_error() {
            let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
            let err: Error = io_err.into();
            assert!(matches!(err, Error::Io(_)));
            assert_eq!(err.kind(), FailureKind::Internal);
        }

        #[test]
        fn from_json_error() {
            let json_err = serde_json::from_str::<i32>("invalid").unwrap_err();
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    mod failure_kind {
        use super::*;

        #[test]
        fn classifies_upstream_errors() {
            let cases = [
                (LlmError::auth("openai", "bad key"), FailureKind::UpstreamAuth),
                (LlmError::rate_limited("openai"), FailureKind::UpstreamRateLimited),
                (LlmError::network("refused"), FailureKind::UpstreamUnavailable),
                (LlmError::http_status(503, "down"), FailureKind::UpstreamUnavailable),
                (LlmError::http_status(418, "teapot"), FailureKind::Internal),
                (
                    LlmError::provider_code("openai", "invalid_request_error", "bad"),
                    FailureKind::Internal,
                ),
            ];

            for (llm_err, expected) in cases {
                let err: Error = llm_err.into();
                assert_eq!(err.kind(), expected, "{err}");
            }
        }

        #[test]
        fn schema_parse_is_its_own_kind() {
            let err = Error::schema_parse("Team", "missing field `city`");
            assert_eq!(err.kind(), FailureKind::SchemaParse);
        }

        #[test]
        fn only_rate_limit_and_unavailable_are_transient() {
            assert!(FailureKind::UpstreamRateLimited.is_transient());
            assert!(FailureKind::UpstreamUnavailable.is_transient());
            assert!(!FailureKind::UpstreamAuth.is_transient());
            assert!(!FailureKind::SchemaParse.is_transient());
            assert!(!FailureKind::Internal.is_transient());
        }

        #[test]
        fn display_uses_stable_code() {
            assert_eq!(FailureKind::SchemaParse.to_string(), "SCHEMA_PARSE");
        }
    }

    mod llm_error {
        use super::*;

        #[test]
        fn auth_display_includes_provider() {
            let err = LlmError::auth("openai", "Invalid API key");
            assert_eq!(err.to_string(), "[openai] Invalid API key");
        }

        #[test]
        fn transient_variants_match_failure_kind() {
            assert!(LlmError::rate_limited("openai").failure_kind().is_transient());
            assert!(LlmError::network("reset").failure_kind().is_transient());
            assert!(!LlmError::auth("openai", "nope").failure_kind().is_transient());
            assert!(!LlmError::internal("bug").failure_kind().is_transient());
            assert!(!LlmError::response_format("json", "html").failure_kind().is_transient());
        }
    }
}
