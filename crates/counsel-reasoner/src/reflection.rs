//! Self-reflection: critique a finished answer and revise its synthesis

use crate::config::{ReasonerConfig, Severity};
use crate::domain::handler_for;
use crate::error::ReflectionError;
use crate::parser::{parse_critique, parse_sections, resolve_markers};
use crate::prompt::PromptBuilder;
use crate::retry::{call_with_retry, RetryPolicy};
use counsel_domain::traits::CompletionService;
use counsel_domain::{Answer, Question};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One finding from the critique call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CritiqueIssue {
    /// How serious the finding is
    pub severity: Severity,
    /// What is wrong
    pub description: String,
}

/// Critique-and-revise pass over a finished answer
///
/// Fails open: any failure returns the answer it was given.
pub struct SelfReflection<C: CompletionService> {
    completion: Arc<C>,
    config: ReasonerConfig,
}

impl<C: CompletionService> SelfReflection<C> {
    /// Create a reflection pass that owns its completion service
    pub fn new(completion: C, config: ReasonerConfig) -> Self {
        Self::from_shared(Arc::new(completion), config)
    }

    /// Create a reflection pass over a shared completion service
    pub fn from_shared(completion: Arc<C>, config: ReasonerConfig) -> Self {
        Self { completion, config }
    }

    /// Critique `answer` and return a revision if a serious issue is found
    ///
    /// Returns `answer` unchanged when the critique finds nothing at or above
    /// the severity threshold, or when any call or parse fails.
    pub async fn reflect(&self, question: &Question, answer: Answer) -> Answer {
        match self.critique_and_revise(question, &answer).await {
            Ok(Some(revised)) => {
                info!(
                    question_id = %question.id(),
                    revision = revised.revision(),
                    "Answer revised after critique"
                );
                revised
            }
            Ok(None) => {
                debug!(question_id = %question.id(), "Critique found nothing to revise");
                answer
            }
            Err(e) => {
                warn!(
                    question_id = %question.id(),
                    error = %e,
                    "Self-reflection failed; keeping the original answer"
                );
                answer
            }
        }
    }

    async fn critique_and_revise(
        &self,
        question: &Question,
        answer: &Answer,
    ) -> Result<Option<Answer>, ReflectionError> {
        let prompts = PromptBuilder::new(question, handler_for(answer.domain()))
            .with_document_excerpt_chars(self.config.document_excerpt_chars);
        let policy = RetryPolicy::from_config(&self.config).single_attempt();

        let critique_prompt = prompts.critique(answer);
        let critique = call_with_retry(&policy, "critique", || {
            self.completion
                .complete(&critique_prompt, self.config.reflection.critique_max_tokens)
        })
        .await
        .map_err(|e| ReflectionError::Critique(e.to_string()))?;

        let issues = parse_critique(&critique).map_err(ReflectionError::Parse)?;
        let threshold = self.config.reflection.severity_threshold;
        let blocking: Vec<&CritiqueIssue> =
            issues.iter().filter(|i| i.severity >= threshold).collect();

        debug!(
            issues = issues.len(),
            blocking = blocking.len(),
            threshold = %threshold,
            "Critique parsed"
        );
        if blocking.is_empty() {
            return Ok(None);
        }

        let revision_prompt = prompts.revision(answer, &blocking);
        let response = call_with_retry(&policy, "revision", || {
            self.completion
                .complete(&revision_prompt, self.config.synthesis_max_tokens)
        })
        .await
        .map_err(|e| ReflectionError::Revision(e.to_string()))?;

        let sections = parse_sections(&response).map_err(ReflectionError::Parse)?;
        let (sections, unresolved) = resolve_markers(sections, answer.citations().len());
        if !unresolved.is_empty() {
            warn!(markers = ?unresolved, "Stripped citation markers from revision");
        }

        Ok(Some(answer.revised(sections.fill_placeholders(), unresolved)))
    }
}
