//! Counsel Reasoner
//!
//! Answers legal questions by orchestrating a completion service (the LLM)
//! and a retrieval service (the passage index).
//!
//! # Architecture
//!
//! ```text
//! Question → plan → RETRIEVE / GENERATE / VERIFY steps (in order) → IRAC synthesis
//!          → Answer → critique → (revision) → Answer
//! ```
//!
//! # Key Features
//!
//! - **Dynamic planning**: the LLM decomposes each question into 2-6 typed steps
//! - **Ordered execution**: steps run strictly in sequence, each seeing the
//!   outputs of the steps it depends on
//! - **Traceable citations**: only RETRIEVE results become citations, and
//!   inline `[n]` markers that name no citation are stripped
//! - **Bounded retries**: every external call has a timeout and retries
//!   transient failures with exponential backoff
//! - **Self-reflection**: an optional critique/revise pass that never fails the
//!   request
//!
//! # Example Usage
//!
//! ```
//! use counsel_domain::{Question, RetrievedPassage};
//! use counsel_llm::MockProvider;
//! use counsel_reasoner::{ReasonerConfig, ReasoningPipeline, PLAN_TASK, SYNTHESIS_TASK};
//! use counsel_retrieval::MockRetriever;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut llm = MockProvider::default();
//! llm.add_response(PLAN_TASK, r#"{"steps": [
//!     {"id": 1, "kind": "RETRIEVE", "description": "Find the rule", "query": "non-compete"},
//!     {"id": 2, "kind": "GENERATE", "description": "Apply the rule"}
//! ]}"#);
//! llm.add_response(SYNTHESIS_TASK, r#"{"issue": "Enforceability", "rule": "Void [1].",
//!     "application": "The clause restrains trade.", "conclusion": "Unenforceable."}"#);
//!
//! let mut retriever = MockRetriever::new();
//! retriever.add_passages("non-compete", vec![
//!     RetrievedPassage::new("Cal. Bus. & Prof. Code § 16600", "Every contract ... is void.", 0.9),
//! ]);
//!
//! let mut config = ReasonerConfig::default();
//! config.reflection.enabled = false;
//!
//! let pipeline = ReasoningPipeline::new(llm, retriever, config);
//! let question = Question::new("Is a non-compete clause enforceable in California?").unwrap();
//! let answer = pipeline.answer(&question).await.unwrap();
//!
//! assert_eq!(answer.citations().len(), 1);
//! assert_eq!(answer.sections().conclusion, "Unenforceable.");
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod domain;
mod error;
mod parser;
mod pipeline;
mod prompt;
mod reflection;
mod retry;


pub use config::{ReasonerConfig, ReflectionConfig, Severity, PLAN_MAX_STEPS, PLAN_MIN_STEPS};
pub use domain::{handler_for, DomainHandler};
pub use error::ReasonerError;
pub use pipeline::ReasoningPipeline;
pub use prompt::{
    CRITIQUE_TASK, GENERATE_TASK, PLAN_TASK, REVISION_TASK, SYNTHESIS_TASK, VERIFY_TASK,
};
pub use reflection::{CritiqueIssue, SelfReflection};
pub use retry::{CallError, RetryPolicy};
