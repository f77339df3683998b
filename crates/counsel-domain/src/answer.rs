//! Answer module - execution log, IRAC sections and the final answer

use crate::citation::{Citation, RetrievedPassage};
use crate::domain_kind::DomainKind;
use crate::plan::{PlanError, PlannedStep, ReasoningPlan, StepId, StepKind};
use crate::question::QuestionId;
use serde::Serialize;

/// Placeholder substituted for any step or section with no usable output
pub const NO_INFORMATION: &str = "No information available.";

/// An executed step: the planned step plus what it produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    step: PlannedStep,
    output: String,
    citations: Vec<Citation>,
    placeholder: bool,
}

impl StepRecord {
    /// Record the passages a RETRIEVE step returned
    ///
    /// Passages become citations owned by the step. An empty result records
    /// the [`NO_INFORMATION`] placeholder as the step output. Non-RETRIEVE
    /// steps never own citations.
    pub fn retrieved(step: PlannedStep, passages: &[RetrievedPassage]) -> Self {
        if passages.is_empty() {
            return Self::placeholder(step);
        }

        let citations: Vec<Citation> = if step.kind == StepKind::Retrieve {
            passages
                .iter()
                .map(|p| Citation::from_retrieval(step.id, p))
                .collect()
        } else {
            Vec::new()
        };

        let output = passages
            .iter()
            .map(|p| format!("{}: {}", p.source_id, p.snippet.trim()))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            step,
            output,
            citations,
            placeholder: false,
        }
    }

    /// Record the text a GENERATE or VERIFY step produced
    pub fn generated(step: PlannedStep, output: impl Into<String>) -> Self {
        let output = output.into();
        if output.trim().is_empty() {
            return Self::placeholder(step);
        }
        Self {
            step,
            output: output.trim().to_string(),
            citations: Vec::new(),
            placeholder: false,
        }
    }

    fn placeholder(step: PlannedStep) -> Self {
        Self {
            step,
            output: NO_INFORMATION.to_string(),
            citations: Vec::new(),
            placeholder: true,
        }
    }

    /// The planned step
    pub fn step(&self) -> &PlannedStep {
        &self.step
    }

    /// Step id
    pub fn id(&self) -> StepId {
        self.step.id
    }

    /// Step kind
    pub fn kind(&self) -> StepKind {
        self.step.kind
    }

    /// Output text (the placeholder when nothing usable came back)
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Citations owned by this step
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Whether the output is the substituted placeholder
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Linear, append-only record of executed steps
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExecutionLog {
    records: Vec<StepRecord>,
}

impl ExecutionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next record; ids must arrive in plan order
    pub fn append(&mut self, record: StepRecord) -> Result<(), PlanError> {
        let position = self.records.len() as u32 + 1;
        if record.id().value() != position {
            return Err(PlanError::OutOfSequence {
                position,
                id: record.id(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Records in execution order
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Look up a record by step id
    pub fn get(&self, id: StepId) -> Option<&StepRecord> {
        self.records.get((id.value() as usize).checked_sub(1)?)
    }

    /// Records for the given dependencies, in plan order
    pub fn outputs_for(&self, dependencies: &[StepId]) -> Vec<&StepRecord> {
        let mut ids = dependencies.to_vec();
        ids.sort();
        ids.dedup();
        ids.into_iter().filter_map(|id| self.get(id)).collect()
    }

    /// Number of executed steps
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no step has executed yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Citations from RETRIEVE records, first occurrence of each source kept
    pub fn collected_citations(&self) -> Vec<Citation> {
        let mut citations: Vec<Citation> = Vec::new();
        for record in self.records.iter().filter(|r| r.kind() == StepKind::Retrieve) {
            for citation in record.citations() {
                if !citations.iter().any(|c| c.same_source(citation)) {
                    citations.push(citation.clone());
                }
            }
        }
        citations
    }
}

/// Issue / rule / application / conclusion framing of the final answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnswerSections {
    /// The legal issue presented
    pub issue: String,
    /// The governing rule, with citation markers
    pub rule: String,
    /// Application of the rule to the facts
    pub application: String,
    /// The conclusion
    pub conclusion: String,
}

impl AnswerSections {
    /// Replace empty sections with the [`NO_INFORMATION`] placeholder
    pub fn fill_placeholders(mut self) -> Self {
        for section in [
            &mut self.issue,
            &mut self.rule,
            &mut self.application,
            &mut self.conclusion,
        ] {
            if section.trim().is_empty() {
                *section = NO_INFORMATION.to_string();
            } else {
                *section = section.trim().to_string();
            }
        }
        self
    }

    /// Render the sections as plain text
    pub fn render(&self) -> String {
        format!(
            "ISSUE\n{}\n\nRULE\n{}\n\nAPPLICATION\n{}\n\nCONCLUSION\n{}",
            self.issue, self.rule, self.application, self.conclusion
        )
    }

    /// Sections as (heading, text) pairs
    pub fn iter(&self) -> [(&'static str, &str); 4] {
        [
            ("Issue", self.issue.as_str()),
            ("Rule", self.rule.as_str()),
            ("Application", self.application.as_str()),
            ("Conclusion", self.conclusion.as_str()),
        ]
    }
}

/// The answer to one question
///
/// Citations are derived from the execution log's RETRIEVE records when the
/// answer is built and are never re-collected, including on revision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    question_id: QuestionId,
    domain: DomainKind,
    plan: ReasoningPlan,
    steps: ExecutionLog,
    sections: AnswerSections,
    citations: Vec<Citation>,
    unresolved_markers: Vec<u32>,
    revision: u32,
}

impl Answer {
    /// Assemble an answer from a completed run
    pub fn new(
        question_id: QuestionId,
        domain: DomainKind,
        plan: ReasoningPlan,
        steps: ExecutionLog,
        sections: AnswerSections,
        unresolved_markers: Vec<u32>,
    ) -> Self {
        let citations = steps.collected_citations();
        Self {
            question_id,
            domain,
            plan,
            steps,
            sections,
            citations,
            unresolved_markers,
            revision: 0,
        }
    }

    /// Replacement answer with a regenerated synthesis; everything else is kept
    pub fn revised(&self, sections: AnswerSections, unresolved_markers: Vec<u32>) -> Self {
        Self {
            sections,
            unresolved_markers,
            revision: self.revision + 1,
            ..self.clone()
        }
    }

    /// Question this answers
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    /// Domain the question was handled as
    pub fn domain(&self) -> DomainKind {
        self.domain
    }

    /// Plan that was executed
    pub fn plan(&self) -> &ReasoningPlan {
        &self.plan
    }

    /// Execution log
    pub fn steps(&self) -> &ExecutionLog {
        &self.steps
    }

    /// IRAC sections
    pub fn sections(&self) -> &AnswerSections {
        &self.sections
    }

    /// Citation set; marker `[n]` refers to `citations()[n - 1]`
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Markers in the synthesis that did not resolve and were stripped
    pub fn unresolved_markers(&self) -> &[u32] {
        &self.unresolved_markers
    }

    /// 0 for the pipeline's answer, incremented by each reflection revision
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Full answer text
    pub fn text(&self) -> String {
        self.sections.render()
    }

    /// Whether any step or section fell back to the placeholder
    pub fn contains_placeholder(&self) -> bool {
        self.steps.records().iter().any(|r| r.is_placeholder())
            || self.sections.iter().iter().any(|(_, text)| *text == NO_INFORMATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(id: u32, kind: StepKind) -> PlannedStep {
        PlannedStep {
            id: StepId::new(id),
            kind,
            description: format!("step {}", id),
            query: None,
            depends_on: (1..id).map(StepId::new).collect(),
        }
    }

    #[test]
    fn test_empty_retrieval_records_placeholder() {
        let record = StepRecord::retrieved(planned(1, StepKind::Retrieve), &[]);
        assert!(record.is_placeholder());
        assert_eq!(record.output(), NO_INFORMATION);
        assert!(record.citations().is_empty());
    }

    #[test]
    fn test_generated_never_owns_citations() {
        let record = StepRecord::retrieved(
            planned(1, StepKind::Generate),
            &[RetrievedPassage::new("doc", "text", 0.9)],
        );
        assert!(record.citations().is_empty());

        let record = StepRecord::generated(planned(1, StepKind::Generate), "   ");
        assert!(record.is_placeholder());
    }

    #[test]
    fn test_log_rejects_out_of_order_append() {
        let mut log = ExecutionLog::new();
        let result = log.append(StepRecord::generated(planned(2, StepKind::Generate), "x"));
        assert!(result.is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_collected_citations_deduplicated() {
        let passage = RetrievedPassage::new("Cal. Bus. & Prof. Code § 16600", "void", 0.9);
        let mut log = ExecutionLog::new();
        log.append(StepRecord::retrieved(planned(1, StepKind::Retrieve), &[passage.clone()]))
            .unwrap();
        log.append(StepRecord::retrieved(planned(2, StepKind::Retrieve), &[passage]))
            .unwrap();

        let citations = log.collected_citations();
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].step_id(), StepId::new(1));
    }

    #[test]
    fn test_outputs_for_sorted_and_deduplicated() {
        let mut log = ExecutionLog::new();
        for id in 1..=3 {
            log.append(StepRecord::generated(planned(id, StepKind::Generate), format!("out {}", id)))
                .unwrap();
        }
        let outputs: Vec<_> = log
            .outputs_for(&[StepId::new(3), StepId::new(1), StepId::new(1)])
            .iter()
            .map(|r| r.output().to_string())
            .collect();
        assert_eq!(outputs, vec!["out 1", "out 3"]);
    }

    #[test]
    fn test_sections_fill_placeholders() {
        let sections = AnswerSections {
            issue: "Whether the clause binds".to_string(),
            ..Default::default()
        }
        .fill_placeholders();
        assert_eq!(sections.rule, NO_INFORMATION);
        assert!(sections.render().starts_with("ISSUE\nWhether the clause binds"));
    }

    #[test]
    fn test_revision_keeps_citations() {
        let plan = ReasoningPlan::new(vec![planned(1, StepKind::Retrieve)]).unwrap();
        let mut log = ExecutionLog::new();
        log.append(StepRecord::retrieved(
            planned(1, StepKind::Retrieve),
            &[RetrievedPassage::new("doc", "text", 0.5)],
        ))
        .unwrap();

        let answer = Answer::new(
            QuestionId::from_value(7),
            DomainKind::General,
            plan,
            log,
            AnswerSections::default().fill_placeholders(),
            vec![],
        );
        let revised = answer.revised(
            AnswerSections {
                conclusion: "Revised".to_string(),
                ..Default::default()
            }
            .fill_placeholders(),
            vec![4],
        );

        assert_eq!(revised.revision(), 1);
        assert_eq!(revised.citations(), answer.citations());
        assert_eq!(revised.unresolved_markers(), &[4]);
        assert_eq!(revised.sections().conclusion, "Revised");
    }
}
