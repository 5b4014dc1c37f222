//! Request options, manager configuration, and status types

use mentor_core::RequestSettings;
use std::collections::HashMap;
use std::time::Duration;

/// Queuing class for a request
///
/// High-priority requests are inserted at the queue head; within a tier,
/// requests execute in FIFO submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Jump the queue
    High,
    /// Normal FIFO ordering
    #[default]
    Normal,
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Retry attempts after the first failure
    pub retries: u32,
    /// Queuing class
    pub priority: Priority,
    /// When false, submission first cancels every other outstanding
    /// request for the same agent name (exclusive semantics). When true
    /// (the default) requests for one agent may run concurrently, which
    /// the task coordinator relies on.
    pub cancellable: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 2,
            priority: Priority::Normal,
            cancellable: true,
        }
    }
}

impl RequestOptions {
    /// Set high priority
    pub fn high_priority(mut self) -> Self {
        self.priority = Priority::High;
        self
    }

    /// Mark exclusive: submission pre-empts the agent's other requests
    pub fn exclusive(mut self) -> Self {
        self.cancellable = false;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry limit
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Runtime limits for a [`RequestManager`](crate::RequestManager)
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum simultaneously in-flight requests
    pub max_concurrent: usize,
    /// Default per-attempt timeout applied by [`ManagerConfig::default_options`]
    pub default_timeout: Duration,
    /// Default retry limit
    pub default_retries: u32,
    /// Response cache time-to-live
    pub cache_ttl: Duration,
    /// Response cache capacity
    pub cache_capacity: u64,
    /// How long the transient `cancelled` status lingers before
    /// reverting to `idle`
    pub status_reset_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            default_timeout: Duration::from_secs(30),
            default_retries: 2,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 10_000,
            status_reset_delay: Duration::from_secs(1),
        }
    }
}

impl ManagerConfig {
    /// Build from loaded runtime settings
    pub fn from_settings(settings: &RequestSettings) -> Self {
        Self {
            max_concurrent: settings.max_concurrent,
            default_timeout: Duration::from_secs(settings.timeout_secs),
            default_retries: settings.retries,
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            ..Self::default()
        }
    }

    /// Request options seeded from this configuration
    pub fn default_options(&self) -> RequestOptions {
        RequestOptions {
            timeout: self.default_timeout,
            retries: self.default_retries,
            ..RequestOptions::default()
        }
    }
}

/// Per-agent processing status, read by the caller for UI feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentStatus {
    /// No outstanding work
    #[default]
    Idle,
    /// At least one request queued or in flight
    Processing,
    /// Last request failed terminally
    Error,
    /// Recently cancelled; decays back to idle
    Cancelled,
}

/// Read-only snapshot of the manager's tracking structures
#[derive(Debug, Clone)]
pub struct QueueStatus {
    /// Requests waiting in the queue
    pub queued: usize,
    /// Requests currently executing
    pub active: usize,
    /// Live streaming requests
    pub streaming: usize,
    /// Status per agent name
    pub agent_statuses: HashMap<String, AgentStatus>,
}
