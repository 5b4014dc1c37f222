//! Error types for request manager operations

use mentor_llm::LLMError;

/// Result type for request operations
pub type Result<T> = std::result::Result<T, RequestError>;

/// Errors surfaced to callers awaiting a managed request
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// No response within the configured window
    #[error("Request timed out")]
    Timeout,

    /// Cancelled explicitly or pre-empted by a later exclusive submission
    #[error("Request cancelled")]
    Cancelled,

    /// Blanket abort of every tracked request
    #[error("Emergency stop")]
    EmergencyStop,

    /// Failure surfaced by the generation backend
    #[error("Backend error: {0}")]
    Backend(#[from] LLMError),

    /// The manager dropped the request without resolving it
    #[error("Request channel closed")]
    ChannelClosed,
}

impl RequestError {
    /// Whether the retry path applies to this failure
    ///
    /// Cancellation in either form is always terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Backend(_))
    }
}
