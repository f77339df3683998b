//! Scripted retriever for deterministic testing

use crate::RetrievalError;
use async_trait::async_trait;
use counsel_domain::traits::RetrievalService;
use counsel_domain::RetrievedPassage;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Rule {
    pattern: String,
    outcomes: VecDeque<Result<Vec<RetrievedPassage>, RetrievalError>>,
}

impl Rule {
    fn next(&mut self) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if self.outcomes.len() > 1 {
            self.outcomes.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        } else {
            self.outcomes.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    queries: Vec<String>,
}

/// Mock retriever for deterministic testing
///
/// Queries are matched by substring against registered rules; unmatched
/// queries return no passages. Every query is recorded.
///
/// # Examples
///
/// ```
/// use counsel_retrieval::MockRetriever;
/// use counsel_domain::{traits::RetrievalService, RetrievedPassage};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let mut retriever = MockRetriever::new();
/// retriever.add_passages("non-compete", vec![
///     RetrievedPassage::new("Cal. Bus. & Prof. Code § 16600", "void", 0.9),
/// ]);
///
/// let hits = rt.block_on(retriever.retrieve("CA non-compete law", 5)).unwrap();
/// assert_eq!(hits.len(), 1);
/// assert!(rt.block_on(retriever.retrieve("patents", 5)).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRetriever {
    state: Arc<Mutex<MockState>>,
}

impl MockRetriever {
    /// Create a retriever with no rules
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return `passages` for queries containing `pattern`
    pub fn add_passages(&mut self, pattern: impl Into<String>, passages: Vec<RetrievedPassage>) {
        self.add_sequence(pattern, vec![Ok(passages)]);
    }

    /// Fail queries containing `pattern` with `error`
    pub fn add_error(&mut self, pattern: impl Into<String>, error: RetrievalError) {
        self.add_sequence(pattern, vec![Err(error)]);
    }

    /// Answer successive matching queries with `outcomes`; the last repeats
    pub fn add_sequence(
        &mut self,
        pattern: impl Into<String>,
        outcomes: Vec<Result<Vec<RetrievedPassage>, RetrievalError>>,
    ) {
        self.state().rules.push(Rule {
            pattern: pattern.into(),
            outcomes: outcomes.into(),
        });
    }

    /// Number of retrieve calls received
    pub fn call_count(&self) -> usize {
        self.state().queries.len()
    }

    /// All queries received, in order
    pub fn queries(&self) -> Vec<String> {
        self.state().queries.clone()
    }
}

#[async_trait]
impl RetrievalService for MockRetriever {
    type Error = RetrievalError;

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>, Self::Error> {
        let mut state = self.state();
        state.queries.push(query.to_string());

        let mut passages = match state.rules.iter_mut().find(|r| query.contains(&r.pattern)) {
            Some(rule) => rule.next()?,
            None => Vec::new(),
        };
        passages.truncate(limit);
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str) -> RetrievedPassage {
        RetrievedPassage::new(id, "text", 0.8)
    }

    #[tokio::test]
    async fn test_truncates_to_limit() {
        let mut retriever = MockRetriever::new();
        retriever.add_passages("law", vec![passage("a"), passage("b"), passage("c")]);
        assert_eq!(retriever.retrieve("law", 2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sequence_then_repeat() {
        let mut retriever = MockRetriever::new();
        retriever.add_sequence(
            "law",
            vec![Err(RetrievalError::Timeout), Ok(vec![passage("a")])],
        );

        assert_eq!(retriever.retrieve("law", 5).await, Err(RetrievalError::Timeout));
        assert_eq!(retriever.retrieve("law", 5).await.unwrap().len(), 1);
        assert_eq!(retriever.retrieve("law", 5).await.unwrap().len(), 1);
        assert_eq!(retriever.call_count(), 3);
    }

    #[tokio::test]
    async fn test_records_queries() {
        let retriever = MockRetriever::new();
        retriever.retrieve("first", 1).await.unwrap();
        retriever.retrieve("second", 1).await.unwrap();
        assert_eq!(retriever.queries(), vec!["first", "second"]);
    }
}
