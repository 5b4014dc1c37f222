//! Conversational voice role

use mentor_llm::{GenerationConfig, Message};
use mentor_request::RequestManager;

use crate::{
    base::{CallOptions, RoleAgent},
    error::Result,
    extract, prompts,
};

/// Built-in example problems, one bank per subject, used when generation
/// produces nothing usable
const FALLBACK_EXAMPLES: &[(&str, &[&str])] = &[
    ("mathematics", &[
        "2x + 5 = 11",
        "Factor x^2 - 9",
        "Find the slope of the line through (1, 2) and (3, 8)",
    ]),
    ("physics", &[
        "Calculate the velocity of an object with mass 5kg and kinetic energy 100J",
        "A ball is dropped from 20m. How long until it hits the ground?",
    ]),
    ("chemistry", &[
        "Balance the equation: H2 + O2 -> H2O",
        "How many moles are in 36g of water?",
    ]),
    ("biology", &[
        "Explain the process of photosynthesis in plants",
        "Describe how DNA replication works",
    ]),
    ("engineering", &[
        "Design a simple lever system with mechanical advantage of 3",
        "Size a beam to carry a 500N point load at midspan",
    ]),
];

/// Agent managing the conversational surface of a tutoring session
pub struct VoiceAgent {
    agent: RoleAgent,
}

impl VoiceAgent {
    pub fn new(config: GenerationConfig, manager: RequestManager) -> Self {
        Self {
            agent: RoleAgent::new("voice", prompts::VOICE, config, manager),
        }
    }

    /// Generate a session-opening greeting
    pub async fn greeting(&self, student_name: &str, student_level: &str) -> Result<String> {
        let messages = vec![Message::user(format!(
            "Generate a welcoming greeting for a student named {student_name} who is at \
             {student_level} level. Keep it encouraging and brief."
        ))];
        self.agent
            .call(messages, None, CallOptions::default().high_priority())
            .await
    }

    /// Respond conversationally to free-form student input
    pub async fn respond(&self, input: &str, context: &str) -> Result<String> {
        let messages = vec![Message::user(input)];
        self.agent
            .call(messages, Some(context), CallOptions::default())
            .await
    }

    /// Suggest example problems for a subject
    ///
    /// Never fails: a backend error or an unusable response falls back to
    /// the built-in bank for that subject.
    pub async fn topic_examples(&self, subject: &str) -> Vec<String> {
        let messages = vec![Message::user(format!(
            "Suggest three short example problems a student could practice in {subject}. \
             One problem per line, no numbering or commentary."
        ))];

        match self.agent.call(messages, None, CallOptions::default()).await {
            Ok(text) => {
                let lines = extract::example_lines(&text);
                if lines.is_empty() {
                    tracing::debug!(subject, "no usable example lines, using fallback bank");
                    fallback_examples(subject)
                } else {
                    lines
                }
            }
            Err(e) => {
                tracing::warn!(subject, error = %e, "example generation failed, using fallback bank");
                fallback_examples(subject)
            }
        }
    }

    pub fn cancel(&self) {
        self.agent.cancel();
    }

    pub fn status(&self) -> mentor_request::AgentStatus {
        self.agent.status()
    }
}

fn fallback_examples(subject: &str) -> Vec<String> {
    let wanted = subject.trim().to_ascii_lowercase();
    let bank = FALLBACK_EXAMPLES
        .iter()
        .find(|(name, _)| *name == wanted)
        .or_else(|| FALLBACK_EXAMPLES.first())
        .map(|(_, examples)| *examples)
        .unwrap_or_default();
    bank.iter().map(|example| example.to_string()).collect()
}
