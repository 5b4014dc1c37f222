//! Coordinated multi-role task execution
//!
//! The coordinator owns one agent per tutoring role and runs them as
//! tracked, progress-reporting task batches on top of the shared request
//! manager. Dependencies between tasks are explicit tagged outcomes, not
//! failures used as control flow.

pub mod coordinator;
pub mod error;
pub mod progress;
pub mod task;

pub use coordinator::{AgentSet, FeedbackResult, ParallelTaskCoordinator, ProblemAnalysisResult};
pub use error::{CoordinationError, Result};
pub use progress::{NoopReporter, ProgressReporter, ProgressTicker};
pub use task::{TaskOutcome, TaskSnapshot, TrackedTask};
