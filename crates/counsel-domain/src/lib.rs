//! Counsel Domain Layer
//!
//! This crate contains the domain model for Counsel's legal reasoning pipeline
//! and the trait boundaries to the two external services it orchestrates.
//!
//! ## Key Concepts
//!
//! - **Question**: The legal question being answered, with optional jurisdiction
//!   and document context
//! - **ReasoningPlan**: Ordered, immutable decomposition of a question into steps
//! - **Step**: A single `RETRIEVE`, `GENERATE` or `VERIFY` call specification
//! - **Citation**: A traceable pointer to a retrieved passage
//! - **Answer**: The IRAC-structured result with its execution log and citations
//!
//! ## Architecture
//!
//! - Pure data types and validation only
//! - Completion and retrieval are reached through the traits in [`traits`];
//!   implementations live in `counsel-llm` and `counsel-retrieval`
//! - Citations can only be built from retrieval results, so generated text can
//!   never be presented as a source

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod answer;
pub mod citation;
pub mod domain_kind;
pub mod plan;
pub mod question;
pub mod traits;

// Re-exports for convenience
pub use answer::{Answer, AnswerSections, ExecutionLog, StepRecord, NO_INFORMATION};
pub use citation::{Citation, CitationKind, RetrievedPassage};
pub use domain_kind::DomainKind;
pub use plan::{PlanError, PlannedStep, ReasoningPlan, StepId, StepKind};
pub use question::{DocumentContext, Question, QuestionError, QuestionId};
