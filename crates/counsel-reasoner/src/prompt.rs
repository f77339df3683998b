//! LLM prompt engineering for planning, step execution, synthesis and reflection
//!
//! Every prompt opens with a task marker line so that each kind of call is
//! recognisable in logs and scripted test providers.

use crate::domain::DomainHandler;
use crate::reflection::CritiqueIssue;
use counsel_domain::{Answer, Citation, ExecutionLog, PlannedStep, Question, StepRecord};
use std::fmt::Write;

/// Marker for the planning call
pub const PLAN_TASK: &str = "TASK: PLAN THE ANALYSIS";
/// Marker for GENERATE step calls
pub const GENERATE_TASK: &str = "TASK: EXECUTE ANALYSIS STEP";
/// Marker for VERIFY step calls
pub const VERIFY_TASK: &str = "TASK: VERIFY INTERMEDIATE RESULT";
/// Marker for the synthesis call
pub const SYNTHESIS_TASK: &str = "TASK: SYNTHESIZE ANSWER";
/// Marker for the critique call
pub const CRITIQUE_TASK: &str = "TASK: CRITIQUE ANSWER";
/// Marker for the revision call
pub const REVISION_TASK: &str = "TASK: REVISE ANSWER";

/// Builds the prompts for one question
pub struct PromptBuilder<'a> {
    question: &'a Question,
    handler: &'a dyn DomainHandler,
    document_excerpt_chars: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for `question` handled by `handler`
    pub fn new(question: &'a Question, handler: &'a dyn DomainHandler) -> Self {
        Self {
            question,
            handler,
            document_excerpt_chars: 4000,
        }
    }

    /// Limit how much attached document text is included
    pub fn with_document_excerpt_chars(mut self, chars: usize) -> Self {
        self.document_excerpt_chars = chars;
        self
    }

    /// Prompt asking for a step decomposition of the question
    pub fn plan(&self, min_steps: usize, max_steps: usize) -> String {
        let mut prompt = String::new();
        prompt.push_str(PLAN_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);

        let _ = writeln!(prompt, "Domain guidance: {}\n", self.handler.planning_guidance());
        let _ = writeln!(
            prompt,
            "Break the question into between {} and {} steps.",
            min_steps, max_steps
        );
        prompt.push_str(PLAN_INSTRUCTIONS);
        prompt
    }

    /// Prompt for a GENERATE step over its dependency outputs
    pub fn generate_step(&self, step: &PlannedStep, context: &[&StepRecord]) -> String {
        let mut prompt = String::new();
        prompt.push_str(GENERATE_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);
        push_step_context(&mut prompt, context);

        let _ = writeln!(prompt, "Current step ({}): {}\n", step.id, step.description);
        prompt.push_str(
            "Carry out the current step using only the prior results above. \
             Be concise and state when the prior results do not support a conclusion.",
        );
        prompt
    }

    /// Prompt for a VERIFY step over its dependency outputs
    pub fn verify_step(&self, step: &PlannedStep, context: &[&StepRecord]) -> String {
        let mut prompt = String::new();
        prompt.push_str(VERIFY_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);
        push_step_context(&mut prompt, context);

        let _ = writeln!(prompt, "Verification step ({}): {}\n", step.id, step.description);
        prompt.push_str(VERIFY_INSTRUCTIONS);
        prompt
    }

    /// Prompt composing all step outputs into an IRAC answer
    pub fn synthesis(&self, log: &ExecutionLog, citations: &[Citation]) -> String {
        let mut prompt = String::new();
        prompt.push_str(SYNTHESIS_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);

        let _ = writeln!(prompt, "Focus: {}\n", self.handler.synthesis_focus());
        push_sources(&mut prompt, citations);

        prompt.push_str("Analysis steps:\n");
        for record in log.records() {
            let _ = writeln!(
                prompt,
                "[Step {} {}] {}\n{}",
                record.id(),
                record.kind(),
                record.step().description,
                record.output()
            );
        }
        prompt.push('\n');
        prompt.push_str(SECTIONS_FORMAT);
        prompt
    }

    /// Prompt asking for a critique of a finished answer
    pub fn critique(&self, answer: &Answer) -> String {
        let mut prompt = String::new();
        prompt.push_str(CRITIQUE_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);
        push_sources(&mut prompt, answer.citations());

        prompt.push_str("Answer under review:\n---\n");
        prompt.push_str(&answer.text());
        prompt.push_str("\n---\n\n");
        prompt.push_str(CRITIQUE_INSTRUCTIONS);
        prompt
    }

    /// Prompt asking for a regenerated synthesis that fixes `issues`
    pub fn revision(&self, answer: &Answer, issues: &[&CritiqueIssue]) -> String {
        let mut prompt = String::new();
        prompt.push_str(REVISION_TASK);
        prompt.push_str("\n\n");
        self.push_question_context(&mut prompt);
        push_sources(&mut prompt, answer.citations());

        prompt.push_str("Current answer:\n---\n");
        prompt.push_str(&answer.text());
        prompt.push_str("\n---\n\n");

        prompt.push_str("Issues to fix:\n");
        for issue in issues {
            let _ = writeln!(prompt, "- [{}] {}", issue.severity, issue.description);
        }
        prompt.push('\n');
        prompt.push_str(
            "Rewrite the answer to fix these issues. Do not introduce sources that are not \
             listed above.\n\n",
        );
        prompt.push_str(SECTIONS_FORMAT);
        prompt
    }

    fn push_question_context(&self, prompt: &mut String) {
        let _ = writeln!(prompt, "Question: {}", self.question.text());
        let _ = writeln!(
            prompt,
            "Jurisdiction: {}",
            self.question.jurisdiction().unwrap_or("Not specified")
        );
        let _ = writeln!(prompt, "Domain: {}", self.handler.kind());

        if let Some(document) = self.question.document() {
            let _ = writeln!(prompt, "Document: {}", document.reference);
            if let Some(excerpt) = document.excerpt(self.document_excerpt_chars) {
                prompt.push_str("Document text:\n---\n");
                prompt.push_str(&excerpt);
                prompt.push_str("\n---\n");
            }
        }
        prompt.push('\n');
    }
}

fn push_step_context(prompt: &mut String, context: &[&StepRecord]) {
    if context.is_empty() {
        prompt.push_str("Prior results: none\n\n");
        return;
    }

    prompt.push_str("Prior results:\n");
    for record in context {
        let _ = writeln!(
            prompt,
            "[Step {} {}] {}\n{}",
            record.id(),
            record.kind(),
            record.step().description,
            record.output()
        );
    }
    prompt.push('\n');
}

fn push_sources(prompt: &mut String, citations: &[Citation]) {
    if citations.is_empty() {
        prompt.push_str("Sources: none were retrieved. Do not use citation markers.\n\n");
        return;
    }

    prompt.push_str("Sources (cite as [n]):\n");
    for (idx, citation) in citations.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "[{}] {}: {}",
            idx + 1,
            citation.source_id(),
            citation.snippet()
        );
    }
    prompt.push('\n');
}

const PLAN_INSTRUCTIONS: &str = r#"Each step uses exactly one tool:
- RETRIEVE: look up legal authority; give a short search "query"
- GENERATE: reason over earlier results (analysis, application to the facts)
- VERIFY: check an earlier result against the question's jurisdiction, document and retrieved authority

Rules:
- Number steps from 1 in execution order
- "depends_on" lists earlier step ids only; omit it to depend on every earlier step
- Retrieve authority before any step that relies on it

Output format (JSON object only, no additional text):
{
  "steps": [
    {"id": 1, "kind": "RETRIEVE", "description": "...", "query": "...", "depends_on": []},
    {"id": 2, "kind": "GENERATE", "description": "...", "depends_on": [1]}
  ]
}"#;

const VERIFY_INSTRUCTIONS: &str = "Check the prior results against the question's stated \
constraints: the jurisdiction, the attached document if any, and the retrieved authority. \
List any statement the authority does not support, then give a one-line verdict.";

const SECTIONS_FORMAT: &str = r#"Write the answer in IRAC form. Cite sources inline with their [n] marker, only for numbers listed above.

Output format (JSON object only, no additional text):
{
  "issue": "...",
  "rule": "...",
  "application": "...",
  "conclusion": "..."
}"#;

const CRITIQUE_INSTRUCTIONS: &str = r#"Identify factual gaps, unsupported claims, or citation mismatches in the answer.
Rate each issue "critical", "significant" or "minor". Return an empty list if there are none.

Output format (JSON object only, no additional text):
{
  "issues": [
    {"severity": "significant", "description": "..."}
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::handler_for;
    use counsel_domain::{DocumentContext, DomainKind, StepId, StepKind};

    fn question() -> Question {
        Question::new("Is a non-compete clause enforceable in California?")
            .unwrap()
            .with_jurisdiction("California")
            .unwrap()
    }

    fn step(id: u32, kind: StepKind) -> PlannedStep {
        PlannedStep {
            id: StepId::new(id),
            kind,
            description: format!("step {} description", id),
            query: None,
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn test_plan_prompt_includes_context_and_bounds() {
        let q = question();
        let prompt = PromptBuilder::new(&q, handler_for(DomainKind::Contract)).plan(2, 6);

        assert!(prompt.starts_with(PLAN_TASK));
        assert!(prompt.contains("Is a non-compete clause enforceable in California?"));
        assert!(prompt.contains("Jurisdiction: California"));
        assert!(prompt.contains("between 2 and 6 steps"));
        assert!(prompt.contains("four corners"));
    }

    #[test]
    fn test_unspecified_jurisdiction() {
        let q = Question::new("What is consideration?").unwrap();
        let prompt = PromptBuilder::new(&q, handler_for(DomainKind::General)).plan(2, 6);
        assert!(prompt.contains("Jurisdiction: Not specified"));
    }

    #[test]
    fn test_document_excerpt_truncated() {
        let q = question().with_document(DocumentContext::with_text("nda.txt", "abcdefghij"));
        let prompt = PromptBuilder::new(&q, handler_for(DomainKind::Contract))
            .with_document_excerpt_chars(4)
            .plan(2, 6);

        assert!(prompt.contains("Document: nda.txt"));
        assert!(prompt.contains("abcd\n"));
        assert!(!prompt.contains("abcde"));
    }

    #[test]
    fn test_step_prompts_include_dependency_outputs() {
        let q = question();
        let builder = PromptBuilder::new(&q, handler_for(DomainKind::Contract));
        let record = StepRecord::generated(step(1, StepKind::Generate), "The clause is void.");

        let prompt = builder.generate_step(&step(2, StepKind::Generate), &[&record]);
        assert!(prompt.starts_with(GENERATE_TASK));
        assert!(prompt.contains("[Step 1 GENERATE] step 1 description\nThe clause is void."));
        assert!(prompt.contains("Current step (2): step 2 description"));

        let prompt = builder.verify_step(&step(3, StepKind::Verify), &[]);
        assert!(prompt.starts_with(VERIFY_TASK));
        assert!(prompt.contains("Prior results: none"));
    }

    #[test]
    fn test_each_prompt_carries_one_marker() {
        let q = question();
        let builder = PromptBuilder::new(&q, handler_for(DomainKind::Contract));
        let markers = [
            PLAN_TASK,
            GENERATE_TASK,
            VERIFY_TASK,
            SYNTHESIS_TASK,
            CRITIQUE_TASK,
            REVISION_TASK,
        ];

        let prompts = [
            builder.plan(2, 6),
            builder.generate_step(&step(1, StepKind::Generate), &[]),
            builder.verify_step(&step(1, StepKind::Verify), &[]),
            builder.synthesis(&ExecutionLog::new(), &[]),
        ];

        for (prompt, own) in prompts.iter().zip(markers) {
            for marker in markers {
                assert_eq!(prompt.contains(marker), marker == own, "{} in {}", marker, own);
            }
        }
    }

    #[test]
    fn test_synthesis_prompt_numbers_sources() {
        use counsel_domain::RetrievedPassage;

        let q = question();
        let passage = RetrievedPassage::new("Cal. Bus. & Prof. Code § 16600", "void", 0.9);
        let citation = Citation::from_retrieval(StepId::new(1), &passage);

        let prompt = PromptBuilder::new(&q, handler_for(DomainKind::Contract))
            .synthesis(&ExecutionLog::new(), &[citation]);

        assert!(prompt.contains("[1] Cal. Bus. & Prof. Code § 16600: void"));
        assert!(prompt.contains("\"conclusion\""));
    }
}
