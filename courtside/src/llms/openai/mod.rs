//! OpenAI API client implementation.
//!
//! This module provides a client for the OpenAI Chat Completions API with
//! support for JSON-schema structured outputs.

mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
