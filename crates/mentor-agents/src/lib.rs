//! Typed tutoring roles over the shared request manager
//!
//! Each role is a thin wrapper around [`RoleAgent`]: it owns a system
//! preamble, phrases its prompts, and parses labeled responses into typed
//! structures. Malformed backend output never surfaces as an error; the
//! parsers in [`extract`] fall back to documented defaults.

pub mod assessment;
pub mod base;
pub mod content;
pub mod error;
pub mod extract;
pub mod extraction;
pub mod feedback;
pub mod hint;
pub mod prompts;
pub mod teaching;
pub mod voice;

pub use assessment::AssessmentAgent;
pub use base::{CallOptions, RoleAgent};
pub use content::ContentAgent;
pub use error::{AgentError, Result};
pub use extract::{Assessment, ProblemAnalysis, SolutionStep, Validation};
pub use extraction::ExtractionAgent;
pub use feedback::FeedbackAgent;
pub use hint::HintAgent;
pub use teaching::TeachingAgent;
pub use voice::VoiceAgent;
