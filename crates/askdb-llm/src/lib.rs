//! askdb-llm: Groq implementation of [`askdb_core::ChatModel`].
//!
//! Groq serves an OpenAI-compatible chat-completions API. Structured output
//! is requested through forced function calling; free text is the first
//! choice's message content.

pub mod groq;
pub mod wire;

pub use groq::GroqChatModel;
