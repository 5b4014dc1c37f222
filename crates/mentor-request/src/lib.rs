//! Centralized request management for generation backends
//!
//! Every backend call in the system flows through one [`RequestManager`]:
//! it serializes requests through a bounded-concurrency queue, caches
//! identical conversations, retries transient failures with exponential
//! backoff, and supports targeted cancellation by agent name as well as a
//! process-wide emergency stop.

pub mod cache;
pub mod cancel;
pub mod error;
pub mod manager;
pub mod options;

pub use cache::ResponseCache;
pub use cancel::{CancelHandle, CancelKind};
pub use error::{RequestError, Result};
pub use manager::{RequestManager, TextStream};
pub use options::{AgentStatus, ManagerConfig, Priority, QueueStatus, RequestOptions};
