//! Passage index: embeds a corpus and answers ranked passage queries

use crate::corpus::{self, Passage};
use crate::embedding::{EmbeddingError, EmbeddingModel, HashingEmbeddingModel};
use crate::vector_index::VectorIndex;
use crate::RetrievalError;
use async_trait::async_trait;
use counsel_domain::traits::RetrievalService;
use counsel_domain::RetrievedPassage;
use std::path::Path;
use tracing::{debug, warn};

/// Default embedding dimension for the hashing model
pub const DEFAULT_DIMENSION: usize = 384;

/// Passages scoring below this cosine similarity are never returned
pub const DEFAULT_MIN_SCORE: f32 = 0.05;

const EF_SEARCH: usize = 64;

/// In-memory passage search over an HNSW index
pub struct PassageIndex {
    model: Box<dyn EmbeddingModel>,
    vectors: VectorIndex,
    passages: Vec<Passage>,
    min_score: f32,
}

impl PassageIndex {
    /// Create an empty index using `model` for embeddings
    pub fn new(model: Box<dyn EmbeddingModel>) -> Self {
        let dimension = model.dimension();
        Self {
            model,
            vectors: VectorIndex::new(dimension),
            passages: Vec::new(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Build an index over `passages` with the default hashing model
    pub fn from_passages(passages: Vec<Passage>) -> Result<Self, RetrievalError> {
        let mut index = Self::new(Box::new(HashingEmbeddingModel::new(DEFAULT_DIMENSION)));
        for passage in passages {
            index.add(passage)?;
        }
        Ok(index)
    }

    /// Build an index over the built-in corpus
    pub fn builtin() -> Result<Self, RetrievalError> {
        Self::from_passages(corpus::builtin_corpus())
    }

    /// Build an index from a JSON corpus file
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, RetrievalError> {
        Self::from_passages(corpus::load_json(path)?)
    }

    /// Set the minimum similarity score for returned passages
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Embed and index a passage
    pub fn add(&mut self, passage: Passage) -> Result<(), RetrievalError> {
        let embedding = self.model.embed(&passage.searchable_text())?;
        let slot = self.passages.len();
        self.vectors.add(slot, &embedding)?;
        self.passages.push(passage);
        Ok(())
    }

    /// Number of indexed passages
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the index holds no passages
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Indexed passages in insertion order
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// Top `limit` passages for `query`, best first
    ///
    /// A query with no content words (only stopwords or punctuation) matches
    /// nothing and returns an empty list.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>, RetrievalError> {
        if self.passages.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let embedding = match self.model.embed(query) {
            Ok(embedding) => embedding,
            Err(EmbeddingError::InvalidInput(reason)) => {
                warn!(query = %query, reason = %reason, "Query has nothing to search for");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let hits = self.vectors.search(&embedding, limit, EF_SEARCH)?;
        let results: Vec<RetrievedPassage> = hits
            .into_iter()
            .filter(|(_, score)| *score >= self.min_score)
            .filter_map(|(slot, score)| {
                self.passages
                    .get(slot)
                    .map(|p| RetrievedPassage::new(p.source_id.clone(), p.text.clone(), score))
            })
            .take(limit)
            .collect();

        debug!(query = %query, hits = results.len(), "Passage search complete");
        Ok(results)
    }
}

#[async_trait]
impl RetrievalService for PassageIndex {
    type Error = RetrievalError;

    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<RetrievedPassage>, Self::Error> {
        self.search(query, limit)
    }
}
