//! OpenAI API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::chat::ChatRequest;
use crate::error::{LlmError, Result};
use crate::message::Message;

use super::config::OpenAIConfig;
use super::types::{OpenAIChatRequest, OpenAIErrorResponse, OpenAIMessage, OpenAIResponseFormat};

/// OpenAI API client.
///
/// Cheap to clone; the configuration and the underlying connection pool are
/// shared.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Create a new OpenAI client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the API key is empty, or an
    /// internal error if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::auth("openai", "API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// See [`OpenAIConfig::from_env`] and [`OpenAI::new`].
    pub fn from_env() -> Result<Self> {
        let config = OpenAIConfig::from_env()?;
        Self::new(config)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Get the default model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the chat completions URL.
    pub(crate) fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Build request headers for JSON requests.
    pub(crate) fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        req
    }

    /// Convert Message to OpenAI format.
    pub(crate) fn convert_message(msg: &Message) -> OpenAIMessage {
        OpenAIMessage {
            role: msg.role.as_str().to_owned(),
            content: msg.content.clone().unwrap_or_default(),
        }
    }

    /// Build the request body.
    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        OpenAIChatRequest {
            model,
            messages: request.messages.iter().map(Self::convert_message).collect(),
            max_completion_tokens: request.max_completion_tokens,
            temperature: request.temperature,
            response_format: request
                .response_format
                .as_ref()
                .map(OpenAIResponseFormat::from_response_format),
        }
    }

    /// Parse an error response from OpenAI.
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        match status {
            401 | 403 => {
                let message = serde_json::from_str::<OpenAIErrorResponse>(body)
                    .map_or_else(|_| format!("HTTP {status}"), |e| e.error.message);
                return LlmError::auth("openai", message);
            }
            429 => return LlmError::rate_limited("openai"),
            500..=599 => {
                return LlmError::network(format!("OpenAI unavailable (HTTP {status}): {body}"));
            }
            _ => {}
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(body) {
            let error = error_response.error;
            let code = error
                .code
                .or(error.error_type)
                .unwrap_or_else(|| status.to_string());
            return LlmError::provider_code("openai", code, error.message);
        }

        LlmError::http_status(status, body.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::chat::ResponseFormat;
    use crate::error::Error;

    fn client() -> OpenAI {
        OpenAI::new(OpenAIConfig::new("sk-test")).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let err = OpenAI::new(OpenAIConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Llm(LlmError::Auth { .. })));
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let client = OpenAI::new(OpenAIConfig::new("k").with_base_url("http://x/v1/")).unwrap();
        assert_eq!(client.chat_url(), "http://x/v1/chat/completions");
    }

    #[test]
    fn test_message_conversion() {
        let converted = OpenAI::convert_message(&Message::user("Hello!"));
        assert_eq!(converted.role, "user");
        assert_eq!(converted.content, "Hello!");
    }

    #[test]
    fn test_build_body_falls_back_to_default_model() {
        let body = client().build_body(&ChatRequest::default().user("hi"));
        assert_eq!(body.model, OpenAIConfig::DEFAULT_MODEL);
    }

    #[test]
    fn test_build_body_carries_json_schema() {
        let request = ChatRequest::new("gpt-4o-mini")
            .user("Please name all of the teams in the NBA.")
            .response_format(ResponseFormat::json_schema(
                "Array_of_Team",
                serde_json::json!({"type": "object"}),
            ));

        let body = serde_json::to_value(client().build_body(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "Array_of_Team");
    }

    mod parse_error {
        use super::*;

        #[test]
        fn maps_unauthorized_to_auth() {
            let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
            let err = OpenAI::parse_error(401, body);
            assert!(matches!(err, LlmError::Auth { ref message, .. } if message.contains("Incorrect API key")));
        }

        #[test]
        fn maps_too_many_requests_to_rate_limited() {
            assert!(matches!(
                OpenAI::parse_error(429, "{}"),
                LlmError::RateLimited { .. }
            ));
        }

        #[test]
        fn maps_server_errors_to_network() {
            assert!(matches!(OpenAI::parse_error(503, "busy"), LlmError::Network(_)));
        }

        #[test]
        fn keeps_provider_code_for_other_errors() {
            let body = r#"{"error":{"message":"bad schema","type":"invalid_request_error","code":null}}"#;
            match OpenAI::parse_error(400, body) {
                LlmError::Provider { code, message, .. } => {
                    assert_eq!(code.as_deref(), Some("invalid_request_error"));
                    assert_eq!(message, "bad schema");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn unknown_body_becomes_http_status() {
            assert!(matches!(
                OpenAI::parse_error(404, "not found"),
                LlmError::HttpStatus { status: 404, .. }
            ));
        }
    }
}
