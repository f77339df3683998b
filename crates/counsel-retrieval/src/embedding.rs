//! Embedding Model for Text Vectorization
//!
//! Text-to-vector conversion for passage search. The bundled model is a
//! feature-hashing bag-of-words embedder: deterministic, dependency-free and
//! lexically meaningful (passages sharing terms with a query score higher),
//! which is enough for a curated legal corpus and for tests. A neural model
//! can be dropped in behind the same [`EmbeddingModel`] trait.
//!
//! # Examples
//!
//! ```rust
//! use counsel_retrieval::embedding::{HashingEmbeddingModel, EmbeddingModel, cosine_similarity};
//!
//! let model = HashingEmbeddingModel::new(256);
//! let a = model.embed("non-compete clause enforceable").unwrap();
//! let b = model.embed("Is a non-compete clause enforceable?").unwrap();
//! let c = model.embed("patent term extension").unwrap();
//!
//! assert_eq!(a.len(), 256);
//! assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during embedding generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    /// Invalid input text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model inference error
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Trait for embedding models
pub trait EmbeddingModel: Send + Sync {
    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from", "has",
    "have", "how", "i", "if", "in", "is", "it", "its", "of", "on", "or", "that", "the", "this",
    "to", "was", "what", "when", "which", "who", "will", "with",
];

/// Feature-hashing bag-of-words embedding model
///
/// Each content token is hashed into one of `dimension` buckets with a hashed
/// sign, and the vector is normalised to unit length for cosine similarity.
/// Tokens are lowercased, stopwords dropped, and a plural `s` stripped.
pub struct HashingEmbeddingModel {
    dimension: usize,
}

impl HashingEmbeddingModel {
    /// Create a new hashing model
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Split text into normalised content tokens
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '§'))
            .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
            .map(|t| {
                if t.len() > 3 && t.ends_with('s') && !t.ends_with("ss") {
                    t[..t.len() - 1].to_string()
                } else {
                    t.to_string()
                }
            })
            .collect()
    }

    fn hash_token(token: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        hasher.finish()
    }
}

impl EmbeddingModel for HashingEmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InferenceFailed(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Text has no content tokens to embed".to_string(),
            ));
        }

        let mut embedding = vec![0.0f32; self.dimension];
        for token in &tokens {
            let hash = Self::hash_token(token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) & 1 == 1 { -1.0 } else { 1.0 };
            embedding[bucket] += sign;
        }

        // Normalize to unit length for cosine similarity
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut embedding {
                *value /= magnitude;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Calculate cosine similarity between two embedding vectors
///
/// Returns 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_deterministic() {
        let model = HashingEmbeddingModel::new(384);
        let text = "Every contract in restraint of trade is void";
        assert_eq!(model.embed(text).unwrap(), model.embed(text).unwrap());
    }

    #[test]
    fn test_embedding_normalized() {
        let model = HashingEmbeddingModel::new(384);
        let embedding = model.embed("unconscionable contract terms").unwrap();
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_stopwords_only_rejected() {
        let model = HashingEmbeddingModel::new(64);
        let result = model.embed("is it the");
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
        assert!(model.embed("").is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let model = HashingEmbeddingModel::new(0);
        assert!(matches!(model.embed("contract"), Err(EmbeddingError::InferenceFailed(_))));
    }

    #[test]
    fn test_tokenize_normalises() {
        let tokens = HashingEmbeddingModel::tokenize("Are Non-Compete Clauses void under § 16600?");
        assert_eq!(tokens, vec!["non", "compete", "clause", "void", "under", "§", "16600"]);
    }

    #[test]
    fn test_shared_terms_score_higher() {
        let model = HashingEmbeddingModel::new(512);
        let query = model.embed("California non-compete clause").unwrap();
        let related = model.embed("Non-compete clauses are void in California").unwrap();
        let unrelated = model.embed("Trademark dilution requires a famous mark").unwrap();

        assert!(cosine_similarity(&query, &related) > 0.5);
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.0001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.0001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
