//! Mock provider implementation for testing.
//!
//! Returns predefined replies instead of calling a real API, and records
//! every request so tests can assert on the prompt that was sent.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

/// One scripted reply of a [`MockProvider`].
#[derive(Debug, Clone)]
pub enum MockReply {
    /// The assistant answers with this text.
    Text(String),
    /// The provider call fails with this error.
    Fail(LlmError),
}

impl MockReply {
    /// Reply with the given text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Reply with the compact JSON rendering of `value`.
    #[must_use]
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }
}

/// A scripted provider for testing.
///
/// Replies are returned in sequence, cycling through them.
///
/// # Example
///
/// ```rust,ignore
/// use courtside::llms::{MockProvider, MockReply};
///
/// let provider = MockProvider::new(vec![
///     MockReply::text(r#"[{"teamName":"Lakers","city":"Los Angeles"}]"#),
///     MockReply::Fail(LlmError::rate_limited("mock")),
/// ]);
/// // First call succeeds, second fails, third succeeds again...
/// ```
#[derive(Debug)]
pub struct MockProvider {
    model_id: String,
    replies: Vec<MockReply>,
    reply_index: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with predefined replies.
    #[must_use]
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            model_id: "mock-model".to_owned(),
            replies,
            reply_index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Shorthand for a provider that always answers with `text`.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(vec![MockReply::text(text)])
    }

    /// Shorthand for a provider that always fails with `error`.
    #[must_use]
    pub fn failing(error: LlmError) -> Self {
        Self::new(vec![MockReply::Fail(error)])
    }

    /// All requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of calls made against this provider.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.reply_index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let index = self.reply_index.fetch_add(1, Ordering::SeqCst);
        if self.replies.is_empty() {
            return Err(LlmError::internal("mock provider has no scripted replies").into());
        }

        match &self.replies[index % self.replies.len()] {
            MockReply::Text(text) => Ok(ChatResponse::from_text(text.clone()).with_model(&self.model_id)),
            MockReply::Fail(err) => Err(err.clone().into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model_id
    }

    fn supports_json_mode(&self) -> bool {
        true
    }
}
