//! Generation Client Abstraction
//!
//! This crate provides a unified interface for talking to text-generation
//! backends (OpenAI-compatible endpoints and Anthropic). Backend selection,
//! credentials, and endpoint are carried in an opaque [`GenerationConfig`]
//! that the rest of the system passes through unmodified.
//!
//! Clients are deliberately retry-free: retry and backoff policy is owned
//! by the request manager layered on top.

pub mod client;
pub mod error;
pub mod types;

// Client implementations
pub mod anthropic;
pub mod openai_compat;

// Re-exports
pub use client::{ChunkStream, GenerationClient};
pub use error::{LLMError, Result};
pub use types::{
    GenerationConfig, Message, MessageRole, Provider, Response, StreamChunk, TokenUsage,
};

pub use anthropic::AnthropicClient;
pub use openai_compat::OpenAiCompatibleClient;

/// Create a client suitable for the given configuration
///
/// Validates that the config carries the credentials its provider needs
/// (Ollama runs without a real key).
pub fn create_client(config: &GenerationConfig) -> Result<Box<dyn GenerationClient>> {
    if config.model_id.is_empty() {
        return Err(LLMError::config("Model ID is required"));
    }
    if config.api_key.is_empty() && config.provider != Provider::Ollama {
        return Err(LLMError::config(format!(
            "API key is required for provider '{}'",
            config.provider.as_str()
        )));
    }

    match config.provider {
        Provider::Anthropic => Ok(Box::new(AnthropicClient::new())),
        Provider::OpenAi | Provider::Groq | Provider::Ollama | Provider::Custom => {
            if config.provider == Provider::Custom && config.base_url.is_none() {
                return Err(LLMError::config("Base URL is required for custom provider"));
            }
            Ok(Box::new(OpenAiCompatibleClient::new()))
        }
    }
}
