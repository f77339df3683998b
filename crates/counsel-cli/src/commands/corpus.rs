//! Corpus command implementation.

use crate::cli::{CorpusAction, CorpusArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use counsel_retrieval::PassageIndex;
use std::path::Path;
use tracing::debug;

/// Execute the corpus command.
pub async fn execute_corpus(args: CorpusArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    match args.action {
        CorpusAction::Search {
            query,
            corpus,
            limit,
        } => {
            if limit == 0 {
                return Err(CliError::InvalidInput(
                    "Limit must be at least 1".to_string(),
                ));
            }
            if query.trim().is_empty() {
                return Err(CliError::InvalidInput("Query must not be empty".to_string()));
            }

            let index = open_index(corpus.as_deref(), config)?;
            let passages = index.search(&query, limit)?;
            println!("{}", formatter.format_passages(&passages)?);
        }
    }

    Ok(())
}

/// Build the passage index: `--corpus` first, then the configured path, then
/// the built-in corpus
pub(crate) fn open_index(explicit: Option<&Path>, config: &Config) -> Result<PassageIndex> {
    let index = match explicit.or(config.corpus_path.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "Loading corpus");
            PassageIndex::load_json(path)?
        }
        None => PassageIndex::builtin()?,
    };

    debug!(passages = index.len(), "Passage index ready");
    Ok(index)
}
