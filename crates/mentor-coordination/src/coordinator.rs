//! Parallel task coordinator
//!
//! Fans work out across the tutoring roles while the request manager
//! serializes the actual backend traffic underneath. Two flows exist:
//! problem analysis (all-or-nothing, with an explicit dependency between
//! analysis and step generation) and feedback generation (tolerant of
//! individual failures).

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use mentor_agents::{
    Assessment, AssessmentAgent, CallOptions, ContentAgent, ExtractionAgent, FeedbackAgent,
    HintAgent, ProblemAnalysis, SolutionStep, TeachingAgent, VoiceAgent,
};
use mentor_llm::GenerationConfig;
use mentor_request::RequestManager;

use crate::{
    error::{CoordinationError, Result},
    progress::{ProgressReporter, ProgressTicker},
    task::{TaskOutcome, TaskSnapshot, TrackedTask},
};

/// The seven tutoring roles, built from one backend configuration and one
/// shared request manager
pub struct AgentSet {
    pub voice: VoiceAgent,
    pub extraction: ExtractionAgent,
    pub teaching: TeachingAgent,
    pub assessment: AssessmentAgent,
    pub feedback: FeedbackAgent,
    pub hint: HintAgent,
    pub content: ContentAgent,
}

impl AgentSet {
    pub fn new(config: &GenerationConfig, manager: &RequestManager) -> Self {
        Self {
            voice: VoiceAgent::new(config.clone(), manager.clone()),
            extraction: ExtractionAgent::new(config.clone(), manager.clone()),
            teaching: TeachingAgent::new(config.clone(), manager.clone()),
            assessment: AssessmentAgent::new(config.clone(), manager.clone()),
            feedback: FeedbackAgent::new(config.clone(), manager.clone()),
            hint: HintAgent::new(config.clone(), manager.clone()),
            content: ContentAgent::new(config.clone(), manager.clone()),
        }
    }

    fn cancel_all(&self) {
        self.voice.cancel();
        self.extraction.cancel();
        self.teaching.cancel();
        self.assessment.cancel();
        self.feedback.cancel();
        self.hint.cancel();
        self.content.cancel();
    }
}

/// Combined output of the problem analysis flow
#[derive(Debug, Clone)]
pub struct ProblemAnalysisResult {
    /// Structured analysis of the problem
    pub analysis: ProblemAnalysis,
    /// Worked solution steps
    pub steps: Vec<SolutionStep>,
    /// Opening guidance for the student
    pub guidance: String,
}

/// Combined output of the feedback flow
///
/// Fields are `None` when the corresponding task failed or was not
/// requested.
#[derive(Debug, Clone)]
pub struct FeedbackResult {
    pub assessment: Option<Assessment>,
    pub feedback: Option<String>,
    pub hint: Option<String>,
}

/// Coordinator running multi-role task batches
pub struct ParallelTaskCoordinator {
    agents: AgentSet,
    tasks: Arc<DashMap<String, TrackedTask>>,
}

impl ParallelTaskCoordinator {
    pub fn new(config: &GenerationConfig, manager: &RequestManager) -> Self {
        Self {
            agents: AgentSet::new(config, manager),
            tasks: Arc::new(DashMap::new()),
        }
    }

    /// The coordinator's role agents
    pub fn agents(&self) -> &AgentSet {
        &self.agents
    }

    fn track(&self, id: &str, agent: &str, description: &str) {
        self.tasks
            .insert(id.to_string(), TrackedTask::new(agent, description));
    }

    fn untrack(&self, id: &str) {
        self.tasks.remove(id);
    }

    /// Analyze a problem with three coordinated tasks
    ///
    /// `analysis` and `guidance` start immediately; `steps` waits for the
    /// analysis outcome and is skipped outright when analysis failed. All
    /// three calls are exclusive so stray earlier requests cannot disturb
    /// the batch, and the batch is all-or-nothing: any failure clears the
    /// tracked tasks and propagates.
    pub async fn analyze_problem(
        &self,
        problem: &str,
        student_level: &str,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<ProblemAnalysisResult> {
        let (outcome_tx, outcome_rx) = watch::channel::<Option<TaskOutcome>>(None);

        let analysis_task = async {
            self.track("analysis", "content", "Analyzing problem structure");
            let ticker = ProgressTicker::start(
                "content",
                "Analyzing problem structure",
                Arc::clone(&reporter),
            );
            let result = self
                .agents
                .content
                .analyze(problem, CallOptions::default().exclusive())
                .await;
            self.untrack("analysis");
            match result {
                Ok(analysis) => {
                    ticker.succeed();
                    let _ = outcome_tx.send(Some(TaskOutcome::Succeeded));
                    Ok(analysis)
                }
                Err(e) => {
                    tracing::error!(error = %e, "problem analysis failed");
                    ticker.fail();
                    let _ = outcome_tx.send(Some(TaskOutcome::Failed(e.to_string())));
                    Err(CoordinationError::from(e))
                }
            }
        };

        let steps_task = async {
            let outcome = {
                let mut rx = outcome_rx.clone();
                loop {
                    let current = rx.borrow_and_update().clone();
                    if let Some(outcome) = current {
                        break outcome;
                    }
                    if rx.changed().await.is_err() {
                        break TaskOutcome::Failed("analysis task dropped".to_string());
                    }
                }
            };

            if let TaskOutcome::Failed(reason) = outcome {
                reporter.report("content", "Generating solution steps skipped", 0);
                return Err(CoordinationError::DependencyFailed {
                    task: "analysis".to_string(),
                    reason,
                });
            }

            self.track("steps", "content", "Generating solution steps");
            let ticker = ProgressTicker::start(
                "content",
                "Generating solution steps",
                Arc::clone(&reporter),
            );
            let result = self
                .agents
                .content
                .solution_steps(problem, student_level, CallOptions::default().exclusive())
                .await;
            self.untrack("steps");
            match result {
                Ok(steps) => {
                    ticker.succeed();
                    Ok(steps)
                }
                Err(e) => {
                    tracing::error!(error = %e, "solution step generation failed");
                    ticker.fail();
                    Err(CoordinationError::from(e))
                }
            }
        };

        let guidance_task = async {
            self.track("guidance", "teaching", "Preparing initial guidance");
            let ticker = ProgressTicker::start(
                "teaching",
                "Preparing initial guidance",
                Arc::clone(&reporter),
            );
            let result = self
                .agents
                .teaching
                .initial_guidance(
                    problem,
                    "General",
                    student_level,
                    CallOptions::default().exclusive(),
                )
                .await;
            self.untrack("guidance");
            match result {
                Ok(guidance) => {
                    ticker.succeed();
                    Ok(guidance)
                }
                Err(e) => {
                    tracing::error!(error = %e, "initial guidance failed");
                    ticker.fail();
                    Err(CoordinationError::from(e))
                }
            }
        };

        let (analysis, steps, guidance) = tokio::join!(analysis_task, steps_task, guidance_task);

        match (analysis, steps, guidance) {
            (Ok(analysis), Ok(steps), Ok(guidance)) => Ok(ProblemAnalysisResult {
                analysis,
                steps,
                guidance,
            }),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.tasks.clear();
                Err(e)
            }
        }
    }

    /// Generate assessment, feedback, and optionally a hint for an answer
    ///
    /// The three tasks run concurrently and tolerate individual failures:
    /// a failed task leaves its field `None`. The concurrent feedback call
    /// uses placeholder correctness; once the assessment lands, a second
    /// call replaces it with feedback matching the real outcome.
    pub async fn generate_feedback(
        &self,
        student_answer: &str,
        expected_step: &str,
        correct_answer: &str,
        student_level: &str,
        attempts: u32,
        reporter: Arc<dyn ProgressReporter>,
    ) -> FeedbackResult {
        let assessment_task = async {
            self.track("assessment", "assessment", "Evaluating answer");
            reporter.report("assessment", "Evaluating answer", 0);
            let result = self
                .agents
                .assessment
                .evaluate(
                    student_answer,
                    expected_step,
                    correct_answer,
                    CallOptions::default(),
                )
                .await;
            self.untrack("assessment");
            match result {
                Ok(assessment) => {
                    reporter.report("assessment", "Evaluating answer completed", 100);
                    Some(assessment)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "assessment failed");
                    reporter.report("assessment", "Evaluating answer failed", 0);
                    None
                }
            }
        };

        let feedback_task = async {
            self.track("feedback", "feedback", "Drafting feedback");
            reporter.report("feedback", "Drafting feedback", 0);
            let result = self
                .agents
                .feedback
                .feedback(false, student_answer, attempts, CallOptions::default())
                .await;
            self.untrack("feedback");
            match result {
                Ok(text) => {
                    reporter.report("feedback", "Drafting feedback completed", 100);
                    Some(text)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "provisional feedback failed");
                    reporter.report("feedback", "Drafting feedback failed", 0);
                    None
                }
            }
        };

        let hint_task = async {
            if attempts <= 1 {
                return None;
            }
            self.track("hint", "hint", "Preparing hint");
            reporter.report("hint", "Preparing hint", 0);
            let result = self
                .agents
                .hint
                .hint(expected_step, student_level, attempts, CallOptions::default())
                .await;
            self.untrack("hint");
            match result {
                Ok(text) => {
                    reporter.report("hint", "Preparing hint completed", 100);
                    Some(text)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "hint generation failed");
                    reporter.report("hint", "Preparing hint failed", 0);
                    None
                }
            }
        };

        let (assessment, mut feedback, hint) =
            tokio::join!(assessment_task, feedback_task, hint_task);

        // Replace the placeholder-correctness feedback with feedback based
        // on the real assessment outcome.
        if let Some(assessment) = &assessment {
            reporter.report("feedback", "Finalizing feedback", 0);
            match self
                .agents
                .feedback
                .feedback(
                    assessment.is_correct,
                    student_answer,
                    attempts,
                    CallOptions::default(),
                )
                .await
            {
                Ok(text) => {
                    reporter.report("feedback", "Finalizing feedback completed", 100);
                    feedback = Some(text);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "final feedback failed, keeping provisional text");
                }
            }
        }

        FeedbackResult {
            assessment,
            feedback,
            hint,
        }
    }

    /// Cancel every owned role agent's requests and clear task tracking
    pub fn cancel_all_tasks(&self) {
        self.agents.cancel_all();
        self.tasks.clear();
        tracing::debug!("cancelled all coordinated tasks");
    }

    /// Snapshot of the tasks currently in flight
    pub fn active_tasks(&self) -> Vec<TaskSnapshot> {
        let now = Instant::now();
        self.tasks
            .iter()
            .map(|entry| TaskSnapshot {
                id: entry.key().clone(),
                agent: entry.value().agent.clone(),
                description: entry.value().description.clone(),
                elapsed: now.duration_since(entry.value().started),
            })
            .collect()
    }
}
