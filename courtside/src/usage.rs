//! Token usage reported by a provider.
//!
//! The `Usage` struct aligns with OpenAI's usage object
//! (`prompt_tokens` / `completion_tokens` / `total_tokens`) and is only used
//! for logging.

use serde::{Deserialize, Serialize};

/// Token usage statistics from an LLM operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the input/prompt.
    #[serde(default, alias = "prompt_tokens")]
    pub input_tokens: u32,

    /// Number of tokens in the output/completion.
    #[serde(default, alias = "completion_tokens")]
    pub output_tokens: u32,

    /// Total tokens used (input + output).
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Create a new usage record.
    #[must_use]
    pub const fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_computes_total() {
        let usage = Usage::new(12, 30);
        assert_eq!(usage.total_tokens, 42);
    }

    #[test]
    fn deserializes_openai_field_names() {
        let usage: Usage = serde_json::from_str(
            r#"{"prompt_tokens": 14, "completion_tokens": 120, "total_tokens": 134}"#,
        )
        .expect("usage should parse");

        assert_eq!(usage.input_tokens, 14);
        assert_eq!(usage.output_tokens, 120);
        assert_eq!(usage.total_tokens, 134);
    }
}
