//! Anthropic (Claude) messages API client

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    client::{ChunkStream, GenerationClient},
    error::{LLMError, Result},
    types::{GenerationConfig, Message, MessageRole, Response, StreamChunk, TokenUsage},
};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// Anthropic requires max_tokens; used when the config doesn't set one.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Client for the Anthropic messages API
pub struct AnthropicClient {
    client: Client,
    timeout: Duration,
}

impl AnthropicClient {
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

    /// Anthropic takes the system prompt as a separate parameter
    fn format_messages(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
        let system = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone());

        let messages: Vec<WireMessage> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|msg| WireMessage {
                role: msg.role.as_str().to_string(),
                content: msg.content.clone(),
            })
            .collect();

        (system, messages)
    }

    fn build_request(messages: &[Message], config: &GenerationConfig, stream: bool) -> WireRequest {
        let (system, formatted) = Self::format_messages(messages);
        WireRequest {
            model: config.model_id.clone(),
            messages: formatted,
            system,
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            stream,
            temperature: config.temperature,
        }
    }

    async fn send(
        &self,
        request: &WireRequest,
        config: &GenerationConfig,
    ) -> Result<reqwest::Response> {
        let base = config
            .base_url
            .as_deref()
            .unwrap_or(ANTHROPIC_API_BASE)
            .trim_end_matches('/');

        let response = self
            .client
            .post(format!("{}/messages", base))
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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
                "Rate limited by Anthropic (retry-after: {:?}s)",
                retry_after_secs
            );
            return Err(LLMError::RateLimited(retry_after_secs));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Anthropic messages request failed: {}", status);
            return Err(LLMError::api(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationClient for AnthropicClient {
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

        let content = parsed
            .content
            .first()
            .ok_or_else(|| LLMError::parse("No content in response"))?;

        Ok(Response {
            content: content.text.clone(),
            model: parsed.model,
            usage: Some(TokenUsage {
                prompt_tokens: parsed.usage.input_tokens,
                completion_tokens: parsed.usage.output_tokens,
                total_tokens: parsed.usage.input_tokens + parsed.usage.output_tokens,
            }),
            finish_reason: Some(parsed.stop_reason),
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
                        if event.event == "content_block_delta" {
                            match serde_json::from_str::<WireStreamEvent>(&event.data) {
                                Ok(chunk) => chunk.delta.map(|delta| {
                                    Ok(StreamChunk {
                                        content: delta.text.unwrap_or_default(),
                                        model: None,
                                        finish_reason: None,
                                    })
                                }),
                                Err(e) => Some(Err(LLMError::parse(e.to_string()))),
                            }
                        } else if event.event == "message_stop" {
                            Some(Ok(StreamChunk {
                                content: String::new(),
                                model: None,
                                finish_reason: Some("end_turn".to_string()),
                            }))
                        } else {
                            None
                        }
                    }
                    Err(e) => Some(Err(LLMError::stream(e.to_string()))),
                }
            });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// Anthropic wire types

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: String,
    content: Vec<WireContent>,
    stop_reason: String,
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct WireStreamEvent {
    #[serde(rename = "type")]
    _type: String,
    delta: Option<WireStreamDelta>,
}

#[derive(Debug, Deserialize)]
struct WireStreamDelta {
    text: Option<String>,
}
