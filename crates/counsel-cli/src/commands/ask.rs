//! Ask command implementation.

use super::corpus::open_index;
use crate::cli::AskArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use counsel_domain::traits::{CompletionService, RetrievalService};
use counsel_domain::{Answer, DocumentContext, DomainKind, Question};
use counsel_llm::GeminiProvider;
use counsel_reasoner::ReasoningPipeline;
use std::fs;
use std::time::Duration;
use tracing::info;

/// Execute the ask command.
pub async fn execute_ask(
    args: AskArgs,
    config: &Config,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<()> {
    let question = build_question(&args)?;
    let index = open_index(args.corpus.as_deref(), config)?;

    let llm = GeminiProvider::new(config.api_key(api_key)?, config.gemini.model.clone())?
        .with_endpoint(config.gemini.endpoint.clone())
        .with_timeout(Duration::from_secs(config.gemini.timeout_secs))?;

    let mut reasoner = config.reasoner.clone();
    if args.no_reflect {
        reasoner.reflection.enabled = false;
    }
    reasoner.validate().map_err(CliError::Config)?;

    let pipeline = ReasoningPipeline::new(llm, index, reasoner);
    let answer = answer_question(&pipeline, &question).await?;

    println!("{}", formatter.format_answer(&answer)?);
    Ok(())
}

/// Turn command-line arguments into a validated question
pub(crate) fn build_question(args: &AskArgs) -> Result<Question> {
    let mut question = Question::new(args.question.as_str())?;

    if let Some(jurisdiction) = &args.jurisdiction {
        question = question.with_jurisdiction(jurisdiction.as_str())?;
    }

    if let Some(domain) = &args.domain {
        let kind = DomainKind::parse(domain).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Unknown domain '{}'. Expected contract, litigation, ip, regulatory or general",
                domain
            ))
        })?;
        question = question.with_domain(kind);
    }

    if let Some(path) = &args.document {
        let text = fs::read_to_string(path)?;
        let reference = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        question = question.with_document(DocumentContext::with_text(reference, text));
    }

    Ok(question)
}

/// Run the pipeline (and reflection, when enabled) for one question
pub(crate) async fn answer_question<C, R>(
    pipeline: &ReasoningPipeline<C, R>,
    question: &Question,
) -> Result<Answer>
where
    C: CompletionService,
    R: RetrievalService,
{
    info!(
        question_id = %question.id(),
        domain = %question.domain(),
        reflection = pipeline.config().reflection.enabled,
        "Answering question"
    );

    Ok(pipeline.answer(question).await?)
}
