//! Hint generation role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::RequestManager;

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    prompts,
};

/// Agent that nudges a stuck student without revealing answers
pub struct HintAgent {
    agent: RoleAgent,
}

impl HintAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("hint", prompts::HINT, config, manager),
        }
    }

    /// A hint for the current step, scaled to prior attempts
    pub async fn hint(
        &self,
        current_step: &str,
        student_level: &str,
        previous_attempts: u32,
        options: CallOptions,
    ) -> Result<String> {
        let messages = vec![Message::user(format!(
            "Generate a helpful hint for step: \"{current_step}\". Student level: \
             {student_level}. Previous attempts: {previous_attempts}. \
             Don't give away the answer."
        ))];
        self.agent.call(messages, None, options).await
    }

    /// Explain a concept at the student's level
    pub async fn explain_concept(&self, concept: &str, student_level: &str) -> Result<String> {
        let messages = vec![Message::user(format!(
            "Explain this concept: \"{concept}\" for a {student_level} level student. \
             Use simple language and examples."
        ))];
        self.agent
            .call(messages, None, CallOptions::default())
            .await
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
