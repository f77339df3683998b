//! Core reasoning pipeline: plan, ordered step execution, synthesis

use crate::config::ReasonerConfig;
use crate::domain::{handler_for, DomainHandler};
use crate::error::ReasonerError;
use crate::parser::{fallback_sections, parse_plan, parse_sections, resolve_markers};
use crate::prompt::PromptBuilder;
use crate::reflection::SelfReflection;
use crate::retry::{call_with_retry, RetryPolicy};
use counsel_domain::traits::{CompletionService, RetrievalService};
use counsel_domain::{
    Answer, ExecutionLog, PlannedStep, Question, RetrievedPassage, StepKind, StepRecord,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-run state; lives on the stack of one `run` call
struct RunContext<'a> {
    question: &'a Question,
    handler: &'static dyn DomainHandler,
    prompts: PromptBuilder<'a>,
    policy: RetryPolicy,
    retrieval_cache: HashMap<String, Vec<RetrievedPassage>>,
}

/// Answers legal questions by planning, executing steps in order, and
/// synthesising an IRAC answer
///
/// `run` takes `&self` and keeps all per-run state local, so one pipeline can
/// serve concurrent questions from behind an `Arc`.
///
/// # Examples
///
/// ```no_run
/// use counsel_domain::Question;
/// use counsel_llm::GeminiProvider;
/// use counsel_reasoner::{ReasonerConfig, ReasoningPipeline};
/// use counsel_retrieval::PassageIndex;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = GeminiProvider::new("api-key", "gemini-2.0-flash")?;
/// let index = PassageIndex::builtin()?;
/// let pipeline = ReasoningPipeline::new(llm, index, ReasonerConfig::default());
///
/// let question = Question::new("Is a non-compete clause enforceable in California?")?
///     .with_jurisdiction("California")?;
/// let answer = pipeline.answer(&question).await?;
/// println!("{}", answer.text());
/// # Ok(())
/// # }
/// ```
pub struct ReasoningPipeline<C, R>
where
    C: CompletionService,
    R: RetrievalService,
{
    completion: Arc<C>,
    retrieval: Arc<R>,
    config: ReasonerConfig,
}

impl<C, R> ReasoningPipeline<C, R>
where
    C: CompletionService,
    R: RetrievalService,
{
    /// Create a pipeline that owns its services
    pub fn new(completion: C, retrieval: R, config: ReasonerConfig) -> Self {
        Self::from_shared(Arc::new(completion), Arc::new(retrieval), config)
    }

    /// Create a pipeline over services shared with other components
    pub fn from_shared(completion: Arc<C>, retrieval: Arc<R>, config: ReasonerConfig) -> Self {
        Self {
            completion,
            retrieval,
            config,
        }
    }

    /// Pipeline configuration
    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Answer a question, then run self-reflection when it is enabled
    pub async fn answer(&self, question: &Question) -> Result<Answer, ReasonerError> {
        let answer = self.run(question).await?;

        if !self.config.reflection.enabled {
            return Ok(answer);
        }

        let reflection = SelfReflection::from_shared(self.completion.clone(), self.config.clone());
        Ok(reflection.reflect(question, answer).await)
    }

    /// Plan, execute every step in order, and synthesise the answer
    pub async fn run(&self, question: &Question) -> Result<Answer, ReasonerError> {
        let domain = question.domain();
        let handler = handler_for(domain);
        let mut ctx = RunContext {
            question,
            handler,
            prompts: PromptBuilder::new(question, handler)
                .with_document_excerpt_chars(self.config.document_excerpt_chars),
            policy: RetryPolicy::from_config(&self.config),
            retrieval_cache: HashMap::new(),
        };

        info!(question_id = %question.id(), domain = %domain, "Starting reasoning run");

        // 1. Plan
        let plan_prompt = ctx.prompts.plan(self.config.min_steps, self.config.max_steps);
        debug!("Plan prompt length: {} chars", plan_prompt.len());

        let response = call_with_retry(&ctx.policy, "plan", || {
            self.completion
                .complete(&plan_prompt, self.config.plan_max_tokens)
        })
        .await
        .map_err(|e| ReasonerError::PlanGeneration(format!("planning call failed: {}", e)))?;

        let plan = parse_plan(&response, self.config.min_steps, self.config.max_steps)?;
        info!(
            steps = plan.len(),
            retrieve = plan.count(StepKind::Retrieve),
            generate = plan.count(StepKind::Generate),
            verify = plan.count(StepKind::Verify),
            "Plan accepted"
        );

        // 2. Execute in declared order
        let mut log = ExecutionLog::new();
        for step in plan.steps() {
            debug!(step = %step.id, kind = %step.kind, "Executing step: {}", step.description);

            let record = self
                .execute_step(step, &log, &mut ctx)
                .await
                .map_err(|reason| ReasonerError::StepExecution {
                    step_id: step.id,
                    completed_steps: log.len(),
                    reason,
                })?;

            if record.is_placeholder() {
                warn!(step = %step.id, kind = %step.kind, "Step produced no usable output");
            }

            log.append(record)
                .map_err(|e| ReasonerError::StepExecution {
                    step_id: step.id,
                    completed_steps: log.len(),
                    reason: e.to_string(),
                })?;
            debug!(step = %step.id, "Step complete");
        }

        // 3. Synthesis
        let citations = log.collected_citations();
        let synthesis_prompt = ctx.prompts.synthesis(&log, &citations);

        let response = call_with_retry(&ctx.policy, "synthesis", || {
            self.completion
                .complete(&synthesis_prompt, self.config.synthesis_max_tokens)
        })
        .await
        .map_err(|e| ReasonerError::StepExecution {
            step_id: plan.synthesis_step_id(),
            completed_steps: log.len(),
            reason: e.to_string(),
        })?;

        let sections = parse_sections(&response).unwrap_or_else(|reason| {
            warn!("Synthesis was not structured ({}); using it as the conclusion", reason);
            fallback_sections(&response)
        });
        let (sections, unresolved) = resolve_markers(sections, citations.len());
        if !unresolved.is_empty() {
            warn!(markers = ?unresolved, "Stripped citation markers with no matching source");
        }

        info!(
            question_id = %question.id(),
            steps = log.len(),
            citations = citations.len(),
            "Reasoning run complete"
        );

        Ok(Answer::new(
            question.id(),
            domain,
            plan,
            log,
            sections.fill_placeholders(),
            unresolved,
        ))
    }

    async fn execute_step(
        &self,
        step: &PlannedStep,
        log: &ExecutionLog,
        ctx: &mut RunContext<'_>,
    ) -> Result<StepRecord, String> {
        match step.kind {
            StepKind::Retrieve => {
                let passages = self.retrieve(step, ctx).await?;
                Ok(StepRecord::retrieved(step.clone(), &passages))
            }
            StepKind::Generate | StepKind::Verify => {
                let context = log.outputs_for(&step.depends_on);
                let prompt = if step.kind == StepKind::Verify {
                    ctx.prompts.verify_step(step, &context)
                } else {
                    ctx.prompts.generate_step(step, &context)
                };

                let output = call_with_retry(&ctx.policy, step.kind.as_str(), || {
                    self.completion.complete(&prompt, self.config.step_max_tokens)
                })
                .await
                .map_err(|e| e.to_string())?;

                Ok(StepRecord::generated(step.clone(), output))
            }
        }
    }

    async fn retrieve(
        &self,
        step: &PlannedStep,
        ctx: &mut RunContext<'_>,
    ) -> Result<Vec<RetrievedPassage>, String> {
        let query = retrieval_query(step, ctx.question, ctx.handler);

        if let Some(cached) = ctx.retrieval_cache.get(&query) {
            debug!(step = %step.id, query = %query, "Retrieval cache hit");
            return Ok(cached.clone());
        }

        let limit = self.config.retrieval_limit;
        let passages = call_with_retry(&ctx.policy, "retrieve", || {
            self.retrieval.retrieve(&query, limit)
        })
        .await
        .map_err(|e| e.to_string())?;

        let fetched = passages.len();
        let kept: Vec<RetrievedPassage> = passages
            .into_iter()
            .filter(|p| p.score >= self.config.min_relevance)
            .take(limit)
            .collect();
        debug!(
            step = %step.id,
            query = %query,
            fetched,
            kept = kept.len(),
            "Retrieval complete"
        );

        ctx.retrieval_cache.insert(query, kept.clone());
        Ok(kept)
    }
}

/// Step query plus the domain hint and jurisdiction, when not already present
fn retrieval_query(step: &PlannedStep, question: &Question, handler: &dyn DomainHandler) -> String {
    let base = step.retrieval_query().trim();
    let lowered = base.to_lowercase();
    let mut parts = vec![base.to_string()];

    for extra in [Some(handler.retrieval_hint()), question.jurisdiction()]
        .into_iter()
        .flatten()
    {
        let extra = extra.trim();
        if !extra.is_empty() && !lowered.contains(&extra.to_lowercase()) {
            parts.push(extra.to_string());
        }
    }

    parts.join(" ")
}
