//! Prelude module for convenient imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use courtside::prelude::*;
//! ```

#[cfg(feature = "openai")]
pub use crate::llms::{OpenAI, OpenAIConfig};
pub use crate::llms::{MockProvider, MockReply};

pub use crate::chat::{
    ChatProvider, ChatRequest, ChatResponse, JsonSchemaSpec, ResponseFormat, SharedChatProvider,
    StopReason,
};
pub use crate::error::{Error, FailureKind, LlmError, Result};
pub use crate::message::{Message, Role};
pub use crate::structured::OutputSchema;
pub use crate::teams::{ErrorPolicy, Team, TeamQuery, TeamsService};
pub use crate::usage::Usage;
