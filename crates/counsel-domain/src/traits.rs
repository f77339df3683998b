//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the reasoning pipeline and the
//! two services it orchestrates. Implementations live in other crates
//! (`counsel-llm`, `counsel-retrieval`) or in tests as deterministic stubs.

use crate::citation::RetrievedPassage;
use async_trait::async_trait;

/// Error raised by an external service
///
/// Callers retry only transient failures (timeouts, rate limits, dropped
/// connections); everything else escalates immediately.
pub trait ServiceError: std::error::Error + Send + Sync + 'static {
    /// Whether retrying the same call may succeed
    fn is_transient(&self) -> bool;
}

/// Text-completion service (the hosted LLM)
///
/// Implemented by the infrastructure layer (counsel-llm)
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Error type for completion calls
    type Error: ServiceError;

    /// Generate a completion for `prompt`, bounded to `max_tokens` output tokens
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error>;
}

/// Passage retrieval service (embedding model + vector index)
///
/// Implemented by the infrastructure layer (counsel-retrieval)
#[async_trait]
pub trait RetrievalService: Send + Sync {
    /// Error type for retrieval calls
    type Error: ServiceError;

    /// Return up to `limit` passages ranked by relevance to `query`
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>, Self::Error>;
}
