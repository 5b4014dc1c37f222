//! Generation client trait definition

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::{GenerationConfig, Message, Response, Result, StreamChunk};

/// Type alias for a stream of chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// Trait for generation backend clients
///
/// A client is a stateless adapter: it sends an ordered message list plus
/// generation parameters to one backend and returns either a complete
/// response or an incremental chunk stream. It knows nothing about queuing,
/// retries, or callers; that discipline lives in the request manager.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Send a conversation and wait for the complete response
    async fn complete(&self, messages: Vec<Message>, config: &GenerationConfig)
        -> Result<Response>;

    /// Send a conversation and stream the response as it's generated
    async fn stream(&self, messages: Vec<Message>, config: &GenerationConfig)
        -> Result<ChunkStream>;

    /// Get the client name
    fn name(&self) -> &str;
}
