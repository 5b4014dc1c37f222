//! Common types for generation backend interactions

use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant message (backend response)
    Assistant,
}

impl MessageRole {
    /// Wire-format name, also used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Response from a generation backend
#[derive(Debug, Clone)]
pub struct Response {
    /// The generated content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Token usage information
    pub usage: Option<TokenUsage>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total number of tokens
    pub total_tokens: u32,
}

/// A chunk from a streaming response
#[derive(Debug, Clone)]
pub struct StreamChunk {
    /// Content delta (incremental text)
    pub content: String,
    /// Model that generated this chunk
    pub model: Option<String>,
    /// Finish reason if this is the last chunk
    pub finish_reason: Option<String>,
}

impl StreamChunk {
    /// Create a new stream chunk
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: None,
            finish_reason: None,
        }
    }

    /// Check if this is the last chunk
    pub fn is_final(&self) -> bool {
        self.finish_reason.is_some()
    }
}

/// Supported backend providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI chat completions API
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Groq (OpenAI-compatible)
    Groq,
    /// Local Ollama server (OpenAI-compatible)
    Ollama,
    /// Any OpenAI-compatible endpoint
    Custom,
}

impl Provider {
    /// Stable identifier, also used in cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Groq => "groq",
            Provider::Ollama => "ollama",
            Provider::Custom => "custom",
        }
    }
}

/// Immutable description of one backend target
///
/// Created and persisted by the caller; the core only reads it and passes
/// it through to the wire clients unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Unique identifier for this configuration
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Backend provider
    pub provider: Provider,
    /// Override for the provider's default endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// API credential
    pub api_key: String,
    /// Model identifier
    pub model_id: String,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum output tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Marks this config as the process-wide default
    #[serde(default)]
    pub is_default: bool,
}

impl GenerationConfig {
    /// Create a minimal config for the given provider and model
    pub fn new(provider: Provider, api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        let model_id = model_id.into();
        Self {
            id: format!("{}-{}", provider.as_str(), model_id),
            name: model_id.clone(),
            provider,
            base_url: None,
            api_key: api_key.into(),
            model_id,
            temperature: None,
            max_tokens: None,
            is_default: false,
        }
    }

    /// Set a custom endpoint
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}
