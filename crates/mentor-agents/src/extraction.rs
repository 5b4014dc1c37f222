//! Problem extraction and validation role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::RequestManager;

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    extract::{self, Validation},
    prompts,
};

/// Agent that isolates a workable problem from raw captured text
pub struct ExtractionAgent {
    agent: RoleAgent,
}

impl ExtractionAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("extraction", prompts::EXTRACTION, config, manager),
        }
    }

    /// Extract the problem statement from raw text
    pub async fn extract_problem(&self, raw_text: &str) -> Result<String> {
        let messages = vec![Message::user(format!(
            "Extract the problem the student wants to work on from this text: \"{raw_text}\""
        ))];
        self.agent
            .call(messages, None, CallOptions::default().high_priority())
            .await
    }

    /// Check whether a problem is well-formed and workable
    pub async fn validate_problem(&self, problem: &str) -> Result<Validation> {
        let messages = vec![Message::user(format!(
            "Is this a valid problem that can be worked through? \"{problem}\". \
             Respond with \"VALID\" or \"INVALID: reason\""
        ))];
        let response = self
            .agent
            .call(messages, None, CallOptions::default())
            .await?;
        Ok(extract::parse_validation(&response))
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
