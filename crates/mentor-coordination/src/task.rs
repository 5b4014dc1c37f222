//! Task tracking types

use std::time::{Duration, Instant};

/// Tagged outcome of a coordinated task, passed between dependent steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task completed
    Succeeded,
    /// The task failed with this reason
    Failed(String),
}

/// One coordinated task currently in flight
#[derive(Debug, Clone)]
pub struct TrackedTask {
    /// Agent name executing the task
    pub agent: String,
    /// Human-readable description
    pub description: String,
    /// When the task started
    pub started: Instant,
}

impl TrackedTask {
    pub fn new(agent: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            description: description.into(),
            started: Instant::now(),
        }
    }
}

/// Read-only view of a tracked task
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// Task identifier
    pub id: String,
    /// Agent name executing the task
    pub agent: String,
    /// Human-readable description
    pub description: String,
    /// Time since the task started
    pub elapsed: Duration,
}
