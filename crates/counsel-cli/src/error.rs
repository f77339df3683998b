//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The question could not be built
    #[error("Invalid question: {0}")]
    Question(#[from] counsel_domain::QuestionError),

    /// The pipeline failed
    #[error("Reasoning failed: {0}")]
    Reasoner(#[from] counsel_reasoner::ReasonerError),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] counsel_llm::LlmError),

    /// Corpus or index error
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] counsel_retrieval::RetrievalError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
