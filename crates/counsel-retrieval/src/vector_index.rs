//! HNSW Vector Index for Passage Search
//!
//! A wrapper around the HNSW algorithm for nearest-neighbor search over
//! passage embeddings.
//!
//! # HNSW Parameters
//!
//! - **M**: Number of bi-directional links per node (default: 16)
//! - **efConstruction**: Candidate list size during construction (default: 200)
//! - **efSearch**: Candidate list size during search, chosen per query

use hnsw_rs::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

const DEFAULT_M: usize = 16;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_ELEMENTS: usize = 100_000;

/// Errors that can occur during vector index operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorIndexError {
    /// Invalid embedding dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension provided
        actual: usize,
    },

    /// Internal HNSW or locking error
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct IndexState {
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// Internal HNSW id -> caller key
    keys: HashMap<usize, usize>,
    next_id: usize,
}

fn new_hnsw() -> Hnsw<'static, f32, DistCosine> {
    let nb_layer = 16.min((DEFAULT_MAX_ELEMENTS as f32).ln().trunc() as usize);
    Hnsw::<'static, f32, DistCosine>::new(
        DEFAULT_M,
        DEFAULT_MAX_ELEMENTS,
        nb_layer,
        DEFAULT_EF_CONSTRUCTION,
        DistCosine {},
    )
}

/// Cosine-distance HNSW index from embeddings to caller-chosen `usize` keys
///
/// # Examples
///
/// ```no_run
/// use counsel_retrieval::vector_index::VectorIndex;
///
/// let index = VectorIndex::new(384);
/// let embedding = vec![0.1; 384];
/// index.add(7, &embedding).unwrap();
///
/// let results = index.search(&embedding, 5, 64).unwrap();
/// assert_eq!(results[0].0, 7);
/// ```
pub struct VectorIndex {
    dimension: usize,
    state: Mutex<IndexState>,
}

impl VectorIndex {
    /// Create a new vector index with the specified dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: Mutex::new(IndexState {
                hnsw: new_hnsw(),
                keys: HashMap::new(),
                next_id: 0,
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, IndexState>, VectorIndexError> {
        self.state
            .lock()
            .map_err(|_| VectorIndexError::Internal("index lock poisoned".to_string()))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() != self.dimension {
            return Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }

    /// Add an embedding under `key`
    pub fn add(&self, key: usize, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;

        let mut state = self.state()?;
        let internal_id = state.next_id;
        state.next_id += 1;
        state.keys.insert(internal_id, key);
        state.hnsw.insert((embedding, internal_id));

        Ok(())
    }

    /// Search for the k nearest neighbors of `query`
    ///
    /// Returns `(key, cosine_similarity)` pairs sorted by similarity, descending.
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(usize, f32)>, VectorIndexError> {
        self.check_dimension(query)?;

        let state = self.state()?;
        if state.keys.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<(usize, f32)> = state
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                state
                    .keys
                    .get(&neighbour.d_id)
                    .map(|&key| (key, 1.0 - neighbour.distance))
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(results)
    }

    /// Number of vectors in the index
    pub fn len(&self) -> usize {
        self.state().map(|s| s.keys.len()).unwrap_or(0)
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
