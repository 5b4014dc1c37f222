//! Problem analysis and decomposition role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::RequestManager;

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    extract::{self, ProblemAnalysis, SolutionStep},
    prompts,
};

/// Agent that analyzes problems and breaks them into solution steps
pub struct ContentAgent {
    agent: RoleAgent,
}

impl ContentAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("content", prompts::CONTENT, config, manager),
        }
    }

    /// Analyze a problem into subject, type, difficulty, concepts, and
    /// strategy
    pub async fn analyze(&self, problem: &str, options: CallOptions) -> Result<ProblemAnalysis> {
        let messages = vec![Message::user(format!(
            "Analyze this problem: \"{problem}\". Provide subject, type, difficulty level, \
             concepts involved, estimated steps, and solution strategy."
        ))];
        let response = self
            .agent
            .call(messages, None, options.high_priority())
            .await?;
        Ok(extract::parse_analysis(&response))
    }

    /// Generate a worked solution as structured steps
    pub async fn solution_steps(
        &self,
        problem: &str,
        student_level: &str,
        options: CallOptions,
    ) -> Result<Vec<SolutionStep>> {
        let messages = vec![Message::user(format!(
            "Generate detailed solution steps for: \"{problem}\". Student level: \
             {student_level}. Include step descriptions, equations, and explanations."
        ))];
        let response = self
            .agent
            .call(messages, None, options.high_priority())
            .await?;
        Ok(extract::parse_steps(&response, problem))
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}
