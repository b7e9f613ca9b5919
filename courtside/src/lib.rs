//! Courtside - typed NBA team listings from LLM structured output
//!
//! This crate asks a chat model to enumerate NBA teams and maps the free-text
//! reply into a `Vec<Team>`, validating the shape against a JSON Schema derived
//! from the Rust type. The model call sits behind the [`chat::ChatProvider`]
//! trait, with an OpenAI implementation and a scripted mock for tests.

pub mod chat;
pub mod error;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod structured;
pub mod teams;
pub mod usage;

pub use error::{Error, FailureKind, LlmError, Result};
#[cfg(feature = "openai")]
pub use llms::{OpenAI, OpenAIConfig};
pub use teams::{ErrorPolicy, Team, TeamQuery, TeamsService};
