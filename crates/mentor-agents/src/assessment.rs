//! Answer assessment role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::RequestManager;

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    extract::{self, Assessment},
    prompts,
};

/// Agent that evaluates student answers
pub struct AssessmentAgent {
    agent: RoleAgent,
}

impl AssessmentAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("assessment", prompts::ASSESSMENT, config, manager),
        }
    }

    /// Evaluate an answer against the expected step and correct answer
    pub async fn evaluate(
        &self,
        student_answer: &str,
        expected_step: &str,
        correct_answer: &str,
        options: CallOptions,
    ) -> Result<Assessment> {
        let messages = vec![Message::user(format!(
            "Evaluate this student answer: \"{student_answer}\" for the step: \
             \"{expected_step}\". The correct answer is: \"{correct_answer}\"."
        ))];
        let response = self
            .agent
            .call(messages, None, options.high_priority())
            .await?;
        Ok(extract::parse_assessment(&response))
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
