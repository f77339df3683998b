//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use counsel_domain::{Answer, Citation, RetrievedPassage, NO_INFORMATION};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest snippet shown in a table cell
const SNIPPET_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a finished answer.
    pub fn format_answer(&self, answer: &Answer) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_answer_json(answer),
            OutputFormat::Table => Ok(self.format_answer_table(answer)),
            OutputFormat::Quiet => Ok(answer.sections().conclusion.clone()),
        }
    }

    /// Format passages returned by a corpus search.
    pub fn format_passages(&self, passages: &[RetrievedPassage]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(passages)?),
            OutputFormat::Table => Ok(self.format_passages_table(passages)),
            OutputFormat::Quiet => {
                let ids: Vec<&str> = passages.iter().map(|p| p.source_id.as_str()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    fn format_answer_json(&self, answer: &Answer) -> Result<String> {
        let value = serde_json::json!({
            "question_id": answer.question_id(),
            "domain": answer.domain(),
            "revision": answer.revision(),
            "sections": answer.sections(),
            "citations": answer.citations(),
            "unresolved_markers": answer.unresolved_markers(),
            "plan": answer.plan(),
            "steps": answer.steps(),
            "text": answer.text(),
        });

        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_answer_table(&self, answer: &Answer) -> String {
        let mut out = String::new();

        for (heading, text) in answer.sections().iter() {
            out.push_str(&self.colorize(&heading.to_uppercase(), "cyan"));
            out.push('\n');
            if text == NO_INFORMATION {
                out.push_str(&self.colorize(text, "yellow"));
            } else {
                out.push_str(text);
            }
            out.push_str("\n\n");
        }

        out.push_str(&self.colorize("SOURCES", "cyan"));
        out.push('\n');
        out.push_str(&self.format_citations_table(answer.citations()));

        if !answer.unresolved_markers().is_empty() {
            let markers: Vec<String> = answer
                .unresolved_markers()
                .iter()
                .map(|m| format!("[{}]", m))
                .collect();
            out.push('\n');
            out.push_str(&self.warning(&format!(
                "Removed citation markers with no matching source: {}",
                markers.join(", ")
            )));
        }

        if answer.revision() > 0 {
            out.push('\n');
            out.push_str(&self.info(&format!(
                "Answer revised {} time(s) after self-review",
                answer.revision()
            )));
        }

        out
    }

    fn format_citations_table(&self, citations: &[Citation]) -> String {
        if citations.is_empty() {
            return self.colorize("No sources were retrieved.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Source", "Step", "Relevance", "Excerpt"]);

        for (i, citation) in citations.iter().enumerate() {
            builder.push_record([
                format!("[{}]", i + 1),
                citation.source_id().to_string(),
                citation.step_id().to_string(),
                format!("{:.2}", citation.relevance_score()),
                truncate(citation.snippet(), SNIPPET_WIDTH),
            ]);
        }

        self.render_table(builder)
    }

    fn format_passages_table(&self, passages: &[RetrievedPassage]) -> String {
        if passages.is_empty() {
            return self.colorize("No passages found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Score", "Source", "Excerpt"]);

        for passage in passages {
            builder.push_record([
                format!("{:.3}", passage.score),
                passage.source_id.clone(),
                truncate(&passage.snippet, SNIPPET_WIDTH),
            ]);
        }

        self.render_table(builder)
    }

    fn render_table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().bold().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with "..."
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use counsel_domain::{
        AnswerSections, DomainKind, ExecutionLog, PlannedStep, QuestionId, ReasoningPlan, StepId,
        StepKind, StepRecord,
    };

    fn create_test_answer(with_sources: bool) -> Answer {
        let retrieve = PlannedStep {
            id: StepId::new(1),
            kind: StepKind::Retrieve,
            description: "Find the California rule".to_string(),
            query: Some("non-compete California".to_string()),
            depends_on: Vec::new(),
        };
        let generate = PlannedStep {
            id: StepId::new(2),
            kind: StepKind::Generate,
            description: "Apply the rule".to_string(),
            query: None,
            depends_on: vec![StepId::new(1)],
        };
        let plan = ReasoningPlan::new(vec![retrieve.clone(), generate.clone()]).unwrap();

        let passages = if with_sources {
            vec![RetrievedPassage::new(
                "Cal. Bus. & Prof. Code § 16600",
                "Every contract by which anyone is restrained from engaging in a lawful profession is void.",
                0.91,
            )]
        } else {
            Vec::new()
        };

        let mut log = ExecutionLog::new();
        log.append(StepRecord::retrieved(retrieve, &passages)).unwrap();
        log.append(StepRecord::generated(generate, "The clause restrains trade."))
            .unwrap();

        let sections = AnswerSections {
            issue: "Whether the non-compete is enforceable.".to_string(),
            rule: "Such clauses are void [1].".to_string(),
            application: "The clause restrains a lawful profession.".to_string(),
            conclusion: "The clause is unenforceable.".to_string(),
        };

        Answer::new(
            QuestionId::new(),
            DomainKind::Contract,
            plan,
            log,
            sections.fill_placeholders(),
            Vec::new(),
        )
    }

    #[test]
    fn test_answer_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_answer(&create_test_answer(true)).unwrap();
        assert!(output.contains("ISSUE"));
        assert!(output.contains("CONCLUSION"));
        assert!(output.contains("Cal. Bus. & Prof. Code § 16600"));
        assert!(output.contains("[1]"));
        assert!(output.contains("0.91"));
    }

    #[test]
    fn test_answer_without_sources() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_answer(&create_test_answer(false)).unwrap();
        assert!(output.contains("No sources were retrieved."));
    }

    #[test]
    fn test_answer_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_answer(&create_test_answer(true)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["revision"], 0);
        assert_eq!(value["sections"]["conclusion"], "The clause is unenforceable.");
        assert_eq!(value["citations"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_answer_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_answer(&create_test_answer(true)).unwrap();
        assert_eq!(output, "The clause is unenforceable.");
    }

    #[test]
    fn test_revised_answer_noted() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let answer = create_test_answer(true);
        let revised = answer.revised(answer.sections().clone(), vec![4]);
        let output = formatter.format_answer(&revised).unwrap();
        assert!(output.contains("revised 1 time(s)"));
        assert!(output.contains("[4]"));
    }

    #[test]
    fn test_passages_quiet_lists_sources() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let passages = vec![
            RetrievedPassage::new("A", "first", 0.8),
            RetrievedPassage::new("B", "second", 0.4),
        ];
        assert_eq!(formatter.format_passages(&passages).unwrap(), "A\nB");
    }

    #[test]
    fn test_empty_passages() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_passages(&[]).unwrap();
        assert!(output.contains("No passages found"));
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("§§§§§§§§§§§§", 6), "§§§...");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }
}
