//! Step-by-step teaching role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::{RequestManager, TextStream};

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    prompts,
};

/// Agent that explains solution steps at the student's level
pub struct TeachingAgent {
    agent: RoleAgent,
}

impl TeachingAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("teaching", prompts::TEACHING, config, manager),
        }
    }

    fn guidance_message(step: &str, student_level: &str) -> Message {
        Message::user(format!(
            "Provide guidance for this step: \"{step}\". Student level: {student_level}. \
             Be encouraging and clear."
        ))
    }

    /// Guidance for one step, as a complete response
    pub async fn step_guidance(&self, step: &str, student_level: &str) -> Result<String> {
        let messages = vec![Self::guidance_message(step, student_level)];
        self.agent
            .call(messages, None, CallOptions::default().high_priority())
            .await
    }

    /// Guidance for one step, streamed as it is generated
    pub fn stream_step_guidance(&self, step: &str, student_level: &str) -> TextStream {
        let messages = vec![Self::guidance_message(step, student_level)];
        self.agent.stream(messages, None)
    }

    /// Opening guidance when a new problem is introduced
    pub async fn initial_guidance(
        &self,
        problem: &str,
        subject: &str,
        student_level: &str,
        options: CallOptions,
    ) -> Result<String> {
        let messages = vec![Message::user(format!(
            "A student is starting this {subject} problem: \"{problem}\". \
             Student level: {student_level}. Give a brief orientation for how to begin, \
             without solving it."
        ))];
        self.agent.call(messages, None, options).await
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
