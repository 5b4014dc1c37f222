//! Error types for coordinated task batches

use mentor_agents::AgentError;

/// Result type for coordination operations
pub type Result<T> = std::result::Result<T, CoordinationError>;

/// Errors surfaced by coordinated batches
#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    /// A task was skipped because the task it depends on failed
    #[error("Dependency '{task}' failed: {reason}")]
    DependencyFailed {
        /// The failed dependency task
        task: String,
        /// Why the dependency failed
        reason: String,
    },

    /// A role agent call failed
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),
}
