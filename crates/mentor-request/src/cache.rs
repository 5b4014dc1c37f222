//! TTL response cache
//!
//! Keys are derived from (provider, model, full message sequence), so
//! identical conversations against the same backend and model are
//! cache-equivalent regardless of which agent submitted them. The cache is
//! a pure optimization: a miss only costs a redundant backend call.

use moka::future::Cache;
use std::time::Duration;

use mentor_llm::{GenerationConfig, Message, Response};

/// Response cache with time-to-live expiry
///
/// Expired entries are evicted lazily on lookup; a periodic sweep (driven
/// by the manager) clears the rest.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<String, Response>,
}

impl ResponseCache {
    /// Create a cache with the given TTL and capacity
    pub fn new(ttl: Duration, capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();
        Self { cache }
    }

    /// Deterministic key for one (backend, conversation) pair
    ///
    /// The raw joined string is used directly so equality is exact; no
    /// hash collisions can alias two different conversations.
    pub fn key(messages: &[Message], config: &GenerationConfig) -> String {
        let message_part = messages
            .iter()
            .map(|m| format!("{}:{}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "{}:{}:{}",
            config.provider.as_str(),
            config.model_id,
            message_part
        )
    }

    /// Look up a cached response for this conversation
    pub async fn get(&self, messages: &[Message], config: &GenerationConfig) -> Option<Response> {
        self.cache.get(&Self::key(messages, config)).await
    }

    /// Store a successful response
    pub async fn insert(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
        response: Response,
    ) {
        self.cache
            .insert(Self::key(messages, config), response)
            .await;
    }

    /// Number of live entries (approximate until a sweep runs)
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Check whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.entry_count() == 0
    }

    /// Evict expired entries
    pub async fn sweep(&self) {
        self.cache.run_pending_tasks().await;
    }
}
