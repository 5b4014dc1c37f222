//! Best-effort parsers for labeled backend output
//!
//! Generation backends are asked for labeled fields but are never trusted
//! to produce them. Every parser here is total: malformed or empty input
//! yields a structure filled with documented defaults, never an error.

/// Outcome of problem validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    /// Whether the problem is workable
    pub is_valid: bool,
    /// Reason given for rejection
    pub reason: Option<String>,
}

/// Structured analysis of a problem
#[derive(Debug, Clone)]
pub struct ProblemAnalysis {
    /// Academic subject ("General" when unstated)
    pub subject: String,
    /// Kind of problem ("Unknown" when unstated)
    pub problem_type: String,
    /// Difficulty tier ("Intermediate" when unstated)
    pub difficulty: String,
    /// Concepts involved
    pub concepts: Vec<String>,
    /// Estimated number of solution steps (3 when unstated)
    pub estimated_steps: u32,
    /// Solution approach; falls back to the whole response text
    pub strategy: String,
}

/// One step of a worked solution
#[derive(Debug, Clone)]
pub struct SolutionStep {
    /// 1-based position in the solution
    pub id: u32,
    /// What to do in this step
    pub description: String,
    /// The expression or equation after this step, if any
    pub equation: String,
    /// Why this step works
    pub explanation: String,
}

/// Evaluation of a student answer
#[derive(Debug, Clone)]
pub struct Assessment {
    /// Whether the answer is correct
    pub is_correct: bool,
    /// Partial credit in [0, 1]
    pub partial_credit: f32,
    /// Evaluation text
    pub feedback: String,
    /// Whether the student should advance
    pub next_step_ready: bool,
}

/// Match a `LABEL:` prefix on one line, case-insensitively
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line[label.len()..].trim_start();
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim())
}

/// First non-empty value of a `LABEL: value` line anywhere in the text
pub fn labeled_field<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines()
        .filter_map(|line| strip_label(line.trim(), label))
        .find(|value| !value.is_empty())
}

/// Parse a "VALID" / "INVALID: reason" validation response
pub fn parse_validation(text: &str) -> Validation {
    let trimmed = text.trim();
    let upper = trimmed.to_ascii_uppercase();

    if upper.starts_with("VALID") {
        return Validation {
            is_valid: true,
            reason: None,
        };
    }

    let reason = if upper.starts_with("INVALID") {
        let rest = trimmed[7..].trim_start().trim_start_matches(':').trim();
        (!rest.is_empty()).then(|| rest.to_string())
    } else {
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    Validation {
        is_valid: false,
        reason,
    }
}

/// Parse a labeled problem analysis, defaulting every missing field
pub fn parse_analysis(text: &str) -> ProblemAnalysis {
    let concepts = labeled_field(text, "CONCEPTS")
        .map(|value| {
            value
                .split(',')
                .map(|concept| concept.trim().to_string())
                .filter(|concept| !concept.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let estimated_steps = labeled_field(text, "STEPS")
        .and_then(|value| value.split_whitespace().next())
        .and_then(|value| value.parse().ok())
        .unwrap_or(3);

    ProblemAnalysis {
        subject: labeled_field(text, "SUBJECT").unwrap_or("General").to_string(),
        problem_type: labeled_field(text, "TYPE").unwrap_or("Unknown").to_string(),
        difficulty: labeled_field(text, "DIFFICULTY")
            .unwrap_or("Intermediate")
            .to_string(),
        concepts,
        estimated_steps,
        strategy: labeled_field(text, "STRATEGY")
            .map(str::to_string)
            .unwrap_or_else(|| text.trim().to_string()),
    }
}

/// Match a `STEP n:` header line, returning the description after the colon
fn step_header(line: &str) -> Option<&str> {
    let head = line.get(..4)?;
    if !head.eq_ignore_ascii_case("STEP") {
        return None;
    }
    let rest = line[4..].trim_start();
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let after = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    let after = after.trim_start();
    let after = after.strip_prefix(':').unwrap_or(after);
    Some(after.trim())
}

/// Parse repeating `STEP n:` / `EQUATION:` / `EXPLANATION:` blocks
///
/// When no block parses, yields a single step carrying the original
/// problem as its equation and the raw response as its explanation.
pub fn parse_steps(text: &str, problem: &str) -> Vec<SolutionStep> {
    let mut steps: Vec<SolutionStep> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(description) = step_header(trimmed) {
            steps.push(SolutionStep {
                id: steps.len() as u32 + 1,
                description: description.to_string(),
                equation: String::new(),
                explanation: String::new(),
            });
        } else if let Some(current) = steps.last_mut() {
            if let Some(equation) = strip_label(trimmed, "EQUATION") {
                current.equation = equation.to_string();
            } else if let Some(explanation) = strip_label(trimmed, "EXPLANATION") {
                current.explanation = explanation.to_string();
            }
        }
    }

    steps.retain(|step| !step.description.is_empty() || !step.equation.is_empty());

    if steps.is_empty() {
        steps.push(SolutionStep {
            id: 1,
            description: "Work through the problem one operation at a time".to_string(),
            equation: problem.to_string(),
            explanation: text.trim().to_string(),
        });
    }

    steps
}

fn parse_yes_no(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "correct" => Some(true),
        "no" | "false" | "incorrect" => Some(false),
        _ => None,
    }
}

/// Parse a labeled assessment, deriving fallbacks from correctness
pub fn parse_assessment(text: &str) -> Assessment {
    let is_correct = labeled_field(text, "CORRECT")
        .and_then(parse_yes_no)
        .unwrap_or_else(|| {
            let lower = text.to_ascii_lowercase();
            lower.contains("correct") && !lower.contains("incorrect")
        });

    let partial_credit = labeled_field(text, "CREDIT")
        .and_then(|value| value.split_whitespace().next())
        .and_then(|value| value.parse::<f32>().ok())
        .map(|credit| credit.clamp(0.0, 1.0))
        .unwrap_or(if is_correct { 1.0 } else { 0.5 });

    let feedback = labeled_field(text, "FEEDBACK")
        .map(str::to_string)
        .unwrap_or_else(|| text.trim().to_string());

    let next_step_ready = labeled_field(text, "READY")
        .and_then(parse_yes_no)
        .unwrap_or(is_correct);

    Assessment {
        is_correct,
        partial_credit,
        feedback,
        next_step_ready,
    }
}

/// Extract candidate example lines from a free-form list response
///
/// Strips list markers and drops headers so only usable example text
/// remains.
pub fn example_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
        })
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labeled_field_case_insensitive() {
        let text = "subject: Algebra\nTYPE: Linear Equation";
        assert_eq!(labeled_field(text, "SUBJECT"), Some("Algebra"));
        assert_eq!(labeled_field(text, "TYPE"), Some("Linear Equation"));
        assert_eq!(labeled_field(text, "DIFFICULTY"), None);
    }

    #[test]
    fn test_labeled_field_skips_empty_values() {
        let text = "STRATEGY:\nSTRATEGY: isolate the variable";
        assert_eq!(labeled_field(text, "STRATEGY"), Some("isolate the variable"));
    }

    #[test]
    fn test_parse_validation() {
        let valid = parse_validation("VALID");
        assert!(valid.is_valid);
        assert!(valid.reason.is_none());

        let invalid = parse_validation("INVALID: not an equation");
        assert!(!invalid.is_valid);
        assert_eq!(invalid.reason.as_deref(), Some("not an equation"));

        let rambling = parse_validation("I don't think this can be solved.");
        assert!(!rambling.is_valid);
        assert!(rambling.reason.is_some());

        let empty = parse_validation("");
        assert!(!empty.is_valid);
        assert!(empty.reason.is_none());
    }

    #[test]
    fn test_parse_analysis_full() {
        let text = "SUBJECT: Mathematics\nTYPE: Linear Equation\nDIFFICULTY: Beginner\n\
                    CONCEPTS: variable isolation, inverse operations\nSTEPS: 2\n\
                    STRATEGY: subtract then divide";
        let analysis = parse_analysis(text);
        assert_eq!(analysis.subject, "Mathematics");
        assert_eq!(analysis.problem_type, "Linear Equation");
        assert_eq!(analysis.difficulty, "Beginner");
        assert_eq!(
            analysis.concepts,
            vec!["variable isolation", "inverse operations"]
        );
        assert_eq!(analysis.estimated_steps, 2);
        assert_eq!(analysis.strategy, "subtract then divide");
    }

    #[test]
    fn test_parse_analysis_malformed_uses_defaults() {
        let analysis = parse_analysis("The problem looks tricky, good luck!");
        assert_eq!(analysis.subject, "General");
        assert_eq!(analysis.problem_type, "Unknown");
        assert_eq!(analysis.difficulty, "Intermediate");
        assert!(analysis.concepts.is_empty());
        assert_eq!(analysis.estimated_steps, 3);
        assert_eq!(analysis.strategy, "The problem looks tricky, good luck!");
    }

    #[test]
    fn test_parse_analysis_empty() {
        let analysis = parse_analysis("");
        assert_eq!(analysis.subject, "General");
        assert_eq!(analysis.estimated_steps, 3);
        assert_eq!(analysis.strategy, "");
    }

    #[test]
    fn test_parse_steps_blocks() {
        let text = "STEP 1: Subtract 5 from both sides\nEQUATION: 2x = 6\n\
                    EXPLANATION: Undo the addition first\n\
                    STEP 2: Divide both sides by 2\nEQUATION: x = 3\n\
                    EXPLANATION: Undo the multiplication";
        let steps = parse_steps(text, "2x + 5 = 11");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].id, 1);
        assert_eq!(steps[0].description, "Subtract 5 from both sides");
        assert_eq!(steps[0].equation, "2x = 6");
        assert_eq!(steps[1].id, 2);
        assert_eq!(steps[1].explanation, "Undo the multiplication");
    }

    #[test]
    fn test_parse_steps_fallback() {
        let steps = parse_steps("Just move things around until x is alone.", "2x + 5 = 11");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].id, 1);
        assert_eq!(steps[0].equation, "2x + 5 = 11");
        assert_eq!(steps[0].explanation, "Just move things around until x is alone.");
    }

    #[test]
    fn test_parse_assessment_labeled() {
        let text = "CORRECT: yes\nCREDIT: 0.9\nFEEDBACK: Nearly perfect\nREADY: no";
        let assessment = parse_assessment(text);
        assert!(assessment.is_correct);
        assert!((assessment.partial_credit - 0.9).abs() < f32::EPSILON);
        assert_eq!(assessment.feedback, "Nearly perfect");
        assert!(!assessment.next_step_ready);
    }

    #[test]
    fn test_parse_assessment_clamps_credit() {
        let assessment = parse_assessment("CORRECT: no\nCREDIT: 7");
        assert!((assessment.partial_credit - 1.0).abs() < f32::EPSILON);

        let assessment = parse_assessment("CORRECT: no\nCREDIT: -2");
        assert_eq!(assessment.partial_credit, 0.0);
    }

    #[test]
    fn test_parse_assessment_freeform_fallback() {
        let assessment = parse_assessment("That's correct, well done!");
        assert!(assessment.is_correct);
        assert!((assessment.partial_credit - 1.0).abs() < f32::EPSILON);
        assert!(assessment.next_step_ready);

        let assessment = parse_assessment("Unfortunately that's incorrect.");
        assert!(!assessment.is_correct);
        assert!((assessment.partial_credit - 0.5).abs() < f32::EPSILON);
        assert!(!assessment.next_step_ready);
    }

    #[test]
    fn test_example_lines_strips_markers() {
        let text = "Here are some examples:\n1. 2x + 5 = 11\n- Balance H2 + O2\n\n* Explain photosynthesis";
        let lines = example_lines(text);
        assert_eq!(lines, vec!["2x + 5 = 11", "Balance H2 + O2", "Explain photosynthesis"]);
    }

    #[test]
    fn test_example_lines_empty_input() {
        assert!(example_lines("").is_empty());
        assert!(example_lines("Examples:\n").is_empty());
    }
}
