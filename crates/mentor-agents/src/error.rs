//! Error types for role agent operations

use mentor_request::RequestError;

/// Result type for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors surfaced by role agent calls
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The underlying managed request failed
    #[error("Request failed: {0}")]
    Request(#[from] RequestError),
}

impl AgentError {
    /// Whether the failure was a cancellation (targeted or emergency)
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            AgentError::Request(RequestError::Cancelled)
                | AgentError::Request(RequestError::EmergencyStop)
        )
    }
}
