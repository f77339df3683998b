//! Counsel LLM Provider Layer
//!
//! Implementations of the `CompletionService` trait from `counsel-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic, scripted provider for testing
//! - `GeminiProvider`: Google Gemini `generateContent` API
//!
//! Providers make a single attempt per call. Retries and timeouts are applied
//! by the reasoner at each call site, using [`ServiceError::is_transient`] to
//! decide what is worth retrying.
//!
//! # Examples
//!
//! ```
//! use counsel_llm::MockProvider;
//! use counsel_domain::traits::CompletionService;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = rt.block_on(provider.complete("test prompt", 64)).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod gemini;

use async_trait::async_trait;
use counsel_domain::traits::{CompletionService, ServiceError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use gemini::GeminiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl ServiceError for LlmError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::Timeout | LlmError::RateLimitExceeded
        )
    }
}

#[derive(Debug)]
struct Rule {
    pattern: String,
    outcomes: VecDeque<Result<String, LlmError>>,
}

impl Rule {
    /// Next scripted outcome; the last one repeats forever
    fn next(&mut self) -> Result<String, LlmError> {
        if self.outcomes.len() > 1 {
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Other("empty script".to_string())))
        } else {
            self.outcomes
                .front()
                .cloned()
                .unwrap_or_else(|| Err(LlmError::Other("empty script".to_string())))
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    rules: Vec<Rule>,
    prompts: Vec<String>,
}

/// Mock LLM provider for deterministic testing
///
/// Responses are scripted per prompt *substring*: the first rule whose pattern
/// occurs in the prompt answers it, otherwise the default response is used.
/// Every prompt is recorded so tests can assert on call order.
///
/// # Examples
///
/// ```
/// use counsel_llm::{LlmError, MockProvider};
/// use counsel_domain::traits::CompletionService;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
///
/// let mut provider = MockProvider::default();
/// provider.add_response("plan", "[]");
/// provider.add_error("critique", LlmError::Timeout);
///
/// assert_eq!(rt.block_on(provider.complete("make a plan", 64)).unwrap(), "[]");
/// assert!(rt.block_on(provider.complete("critique this", 64)).is_err());
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for unmatched prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer prompts containing `pattern` with `response`
    pub fn add_response(&mut self, pattern: impl Into<String>, response: impl Into<String>) {
        self.add_sequence(pattern, vec![Ok(response.into())]);
    }

    /// Fail prompts containing `pattern` with `error`
    pub fn add_error(&mut self, pattern: impl Into<String>, error: LlmError) {
        self.add_sequence(pattern, vec![Err(error)]);
    }

    /// Answer successive matching prompts with `outcomes` in order
    ///
    /// The last outcome repeats once the sequence is exhausted.
    pub fn add_sequence(
        &mut self,
        pattern: impl Into<String>,
        outcomes: Vec<Result<String, LlmError>>,
    ) {
        self.state().rules.push(Rule {
            pattern: pattern.into(),
            outcomes: outcomes.into(),
        });
    }

    /// Number of completed calls
    pub fn call_count(&self) -> usize {
        self.state().prompts.len()
    }

    /// Number of recorded prompts containing `pattern`
    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.state()
            .prompts
            .iter()
            .filter(|p| p.contains(pattern))
            .count()
    }

    /// All prompts received, in order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Forget recorded prompts
    pub fn reset_call_count(&self) {
        self.state().prompts.clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl CompletionService for MockProvider {
    type Error = LlmError;

    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, Self::Error> {
        let mut state = self.state();
        state.prompts.push(prompt.to_string());

        match state.rules.iter_mut().find(|r| prompt.contains(&r.pattern)) {
            Some(rule) => rule.next(),
            None => Ok(self.default_response.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider.complete("any prompt", 16).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_matches_substrings_in_order() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("hello again", "shadowed");

        assert_eq!(provider.complete("say hello again", 16).await.unwrap(), "world");
        assert_eq!(provider.complete("unknown", 16).await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_sequence_repeats_last() {
        let mut provider = MockProvider::default();
        provider.add_sequence(
            "flaky",
            vec![Err(LlmError::RateLimitExceeded), Ok("recovered".to_string())],
        );

        assert_eq!(provider.complete("flaky", 16).await, Err(LlmError::RateLimitExceeded));
        assert_eq!(provider.complete("flaky", 16).await.unwrap(), "recovered");
        assert_eq!(provider.complete("flaky", 16).await.unwrap(), "recovered");
    }

    #[tokio::test]
    async fn test_mock_provider_records_prompts() {
        let provider = MockProvider::new("test");

        provider.complete("prompt1", 16).await.unwrap();
        provider.complete("prompt2", 16).await.unwrap();
        assert_eq!(provider.prompts(), vec!["prompt1", "prompt2"]);
        assert_eq!(provider.calls_matching("prompt"), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete("test", 16).await.unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::RateLimitExceeded.is_transient());
        assert!(LlmError::Communication("reset".into()).is_transient());
        assert!(!LlmError::Authentication("bad key".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("x".into()).is_transient());
        assert!(!LlmError::InvalidResponse("x".into()).is_transient());
    }
}
