//! LLM backend implementations.
//!
//! Each backend is organized into its own submodule.
//!
//! # Available Backends
//!
//! - [`openai`] - OpenAI Chat Completions API (GPT-4o, GPT-4o-mini, etc.)
//! - [`mock`] - Scripted provider for tests and offline runs

pub mod mock;
#[cfg(feature = "openai")]
pub mod openai;

pub use mock::{MockProvider, MockReply};
#[cfg(feature = "openai")]
pub use openai::{OpenAI, OpenAIConfig};
