//! Counsel Retrieval Service
//!
//! Implementations of the `RetrievalService` trait from `counsel-domain`.
//!
//! # Components
//!
//! - `embedding`: text-to-vector conversion (`HashingEmbeddingModel`)
//! - `vector_index`: HNSW cosine index over embeddings
//! - `corpus`: passage records, JSON loading and the built-in corpus
//! - `PassageIndex`: embedding + vector index over a passage corpus
//! - `MockRetriever`: scripted retriever for tests
//!
//! # Examples
//!
//! ```
//! use counsel_retrieval::PassageIndex;
//!
//! let index = PassageIndex::builtin().unwrap();
//! let hits = index.search("non-compete clause California", 3).unwrap();
//! assert!(hits[0].source_id.contains("16600"));
//! ```

#![warn(missing_docs)]

pub mod corpus;
pub mod embedding;
pub mod index;
pub mod mock;
pub mod vector_index;

use counsel_domain::traits::ServiceError;
use thiserror::Error;

pub use corpus::{builtin_corpus, Passage};
pub use embedding::{EmbeddingError, EmbeddingModel, HashingEmbeddingModel};
pub use index::PassageIndex;
pub use mock::MockRetriever;
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur during retrieval
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index failure
    #[error("Index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Corpus could not be loaded or is invalid
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Backing store temporarily unreachable
    #[error("Retrieval service unavailable: {0}")]
    Unavailable(String),

    /// Retrieval did not complete in time
    #[error("Retrieval timed out")]
    Timeout,
}

impl ServiceError for RetrievalError {
    fn is_transient(&self) -> bool {
        matches!(self, RetrievalError::Unavailable(_) | RetrievalError::Timeout)
    }
}

impl From<std::io::Error> for RetrievalError {
    fn from(err: std::io::Error) -> Self {
        RetrievalError::Corpus(err.to_string())
    }
}

impl From<serde_json::Error> for RetrievalError {
    fn from(err: serde_json::Error) -> Self {
        RetrievalError::Corpus(format!("invalid corpus JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(RetrievalError::Timeout.is_transient());
        assert!(RetrievalError::Unavailable("down".into()).is_transient());
        assert!(!RetrievalError::Corpus("bad".into()).is_transient());
        assert!(!RetrievalError::Embedding(EmbeddingError::InvalidInput("x".into())).is_transient());
    }
}
