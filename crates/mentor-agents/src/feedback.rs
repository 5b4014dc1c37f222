//! Motivational feedback role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::{RequestManager, TextStream};

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    prompts,
};

/// Agent that turns assessment outcomes into encouraging feedback
pub struct FeedbackAgent {
    agent: RoleAgent,
}

impl FeedbackAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("feedback", prompts::FEEDBACK, config, manager),
        }
    }

    fn feedback_message(is_correct: bool, student_answer: &str, attempt: u32) -> Message {
        let tone = if is_correct { "positive" } else { "constructive" };
        Message::user(format!(
            "Generate {tone} feedback for student answer: \"{student_answer}\". \
             This is attempt #{attempt}. Be encouraging."
        ))
    }

    /// Feedback for an answer, as a complete response
    pub async fn feedback(
        &self,
        is_correct: bool,
        student_answer: &str,
        attempt: u32,
        options: CallOptions,
    ) -> Result<String> {
        let messages = vec![Self::feedback_message(is_correct, student_answer, attempt)];
        self.agent.call(messages, None, options).await
    }

    /// Feedback streamed as it is generated
    pub fn stream_feedback(
        &self,
        is_correct: bool,
        student_answer: &str,
        attempt: u32,
    ) -> TextStream {
        let messages = vec![Self::feedback_message(is_correct, student_answer, attempt)];
        self.agent.stream(messages, None)
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
