//! Capability seams. Everything the retrieval core talks to that may block on
//! I/O or a model sits behind one of these traits so it can be swapped for a
//! fake in tests.

use async_trait::async_trait;

use crate::filter::SearchFilter;
use crate::types::{Chunk, VectorHit};

/// Read access to the chunk corpus built by the ingestion step.
#[async_trait]
pub trait CorpusReader: Send + Sync {
    /// Every chunk in insertion order. Empty, not an error, for an empty corpus.
    async fn get_all(&self) -> anyhow::Result<Vec<Chunk>>;
    /// Chunks for `ids`, order-matching; unknown ids are skipped.
    async fn get_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Chunk>>;
}

/// Nearest-neighbour search over chunk vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Up to `k` hits ordered by ascending distance, restricted to chunks
    /// satisfying every predicate in `filter`.
    async fn search(
        &self,
        query_vec: &[f32],
        k: usize,
        filter: &SearchFilter,
    ) -> anyhow::Result<Vec<VectorHit>>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    /// One fixed-length vector per input, order-preserving.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Free-text completion, used for query expansion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Direct (query, passage) relevance scoring.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// One score per pair, order-preserving; higher is more relevant.
    async fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>>;
}
