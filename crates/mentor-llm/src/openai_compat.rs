//! OpenAI-compatible chat completions client
//!
//! One client covers every backend that speaks the chat completions wire
//! format: OpenAI itself, Groq, a local Ollama server, and arbitrary custom
//! endpoints. The endpoint is taken from the `GenerationConfig` at call
//! time, so a single client instance serves any number of configs.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    client::{ChunkStream, GenerationClient},
    error::{LLMError, Result},
    types::{GenerationConfig, Message, Provider, Response, StreamChunk, TokenUsage},
};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const OLLAMA_API_BASE: &str = "http://localhost:11434/v1";

/// Client for OpenAI-compatible chat completions endpoints
pub struct OpenAiCompatibleClient {
    client: Client,
    timeout: Duration,
}

impl OpenAiCompatibleClient {
    /// Create a new client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set transport-level request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the endpoint base for a config
    fn base_url(config: &GenerationConfig) -> Result<String> {
        if let Some(url) = &config.base_url {
            return Ok(url.trim_end_matches('/').to_string());
        }
        match config.provider {
            Provider::OpenAi => Ok(OPENAI_API_BASE.to_string()),
            Provider::Groq => Ok(GROQ_API_BASE.to_string()),
            Provider::Ollama => Ok(OLLAMA_API_BASE.to_string()),
            Provider::Custom => Err(LLMError::config(
                "Base URL is required for custom provider",
            )),
            Provider::Anthropic => Err(LLMError::UnsupportedProvider(
                "anthropic (use AnthropicClient)".to_string(),
            )),
        }
    }

    fn format_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|msg| WireMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }

    fn build_request(messages: &[Message], config: &GenerationConfig, stream: bool) -> WireRequest {
        WireRequest {
            model: config.model_id.clone(),
            messages: Self::format_messages(messages),
            stream,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    async fn send(
        &self,
        request: &WireRequest,
        config: &GenerationConfig,
    ) -> Result<reqwest::Response> {
        let base = Self::base_url(config)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", base))
            .header("Authorization", format!("Bearer {}", config.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::Http(e)
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs: Option<u64> = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            tracing::warn!(
                "Rate limited by {} (retry-after: {:?}s)",
                base,
                retry_after_secs
            );
            return Err(LLMError::RateLimited(retry_after_secs));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Chat completions request to {} failed: {}", base, status);
            return Err(LLMError::api(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OpenAiCompatibleClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for OpenAiCompatibleClient {
    async fn complete(
        &self,
        messages: Vec<Message>,
        config: &GenerationConfig,
    ) -> Result<Response> {
        let request = Self::build_request(&messages, config, false);
        let response = self.send(&request, config).await?;

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LLMError::parse(e.to_string()))?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| LLMError::parse("No choices in response"))?;

        Ok(Response {
            content: choice.message.content.clone().unwrap_or_default(),
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.clone(),
        })
    }

    async fn stream(
        &self,
        messages: Vec<Message>,
        config: &GenerationConfig,
    ) -> Result<ChunkStream> {
        let request = Self::build_request(&messages, config, true);
        let response = self.send(&request, config).await?;

        let stream = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => {
                        if event.data == "[DONE]" {
                            return Some(Ok(StreamChunk {
                                content: String::new(),
                                model: None,
                                finish_reason: Some("stop".to_string()),
                            }));
                        }
                        match serde_json::from_str::<WireStreamEvent>(&event.data) {
                            Ok(chunk) => {
                                let delta = chunk
                                    .choices
                                    .first()
                                    .and_then(|c| c.delta.content.clone())
                                    .unwrap_or_default();
                                let finish = chunk
                                    .choices
                                    .first()
                                    .and_then(|c| c.finish_reason.clone());
                                if delta.is_empty() && finish.is_none() {
                                    None
                                } else {
                                    Some(Ok(StreamChunk {
                                        content: delta,
                                        model: None,
                                        finish_reason: finish,
                                    }))
                                }
                            }
                            Err(e) => Some(Err(LLMError::parse(e.to_string()))),
                        }
                    }
                    Err(e) => Some(Err(LLMError::stream(e.to_string()))),
                }
            });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireStreamEvent {
    choices: Vec<WireStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct WireStreamChoice {
    delta: WireStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireStreamDelta {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_defaults() {
        let openai = GenerationConfig::new(Provider::OpenAi, "key", "gpt-4o");
        assert_eq!(
            OpenAiCompatibleClient::base_url(&openai).unwrap(),
            OPENAI_API_BASE
        );

        let groq = GenerationConfig::new(Provider::Groq, "key", "llama-3.1-70b");
        assert_eq!(OpenAiCompatibleClient::base_url(&groq).unwrap(), GROQ_API_BASE);

        let ollama = GenerationConfig::new(Provider::Ollama, "ollama", "llama3");
        assert_eq!(
            OpenAiCompatibleClient::base_url(&ollama).unwrap(),
            OLLAMA_API_BASE
        );
    }

    #[test]
    fn test_custom_requires_base_url() {
        let custom = GenerationConfig::new(Provider::Custom, "key", "model");
        assert!(OpenAiCompatibleClient::base_url(&custom).is_err());

        let custom = custom.with_base_url("https://example.com/v1/");
        assert_eq!(
            OpenAiCompatibleClient::base_url(&custom).unwrap(),
            "https://example.com/v1"
        );
    }

    #[test]
    fn test_message_formatting() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let formatted = OpenAiCompatibleClient::format_messages(&messages);
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted[0].role, "system");
        assert_eq!(formatted[1].role, "user");
    }

    #[test]
    fn test_request_carries_generation_params() {
        let mut config = GenerationConfig::new(Provider::OpenAi, "key", "gpt-4o");
        config.temperature = Some(0.7);
        config.max_tokens = Some(1000);

        let request =
            OpenAiCompatibleClient::build_request(&[Message::user("hi")], &config, false);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(1000));
        assert!(!request.stream);
    }
}
