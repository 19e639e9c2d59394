use anyhow::{anyhow, bail, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use priorart_core::filter::SearchFilter;
use priorart_core::traits::{Embedder, VectorIndex};
use priorart_core::types::ChunkId;

use crate::timeout::bounded;

/// Outcome of dense scoring for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseScores {
    /// Raw distances (lower is closer); empty when nothing passed the filter.
    Scored(HashMap<ChunkId, f32>),
    /// Embedding or search failed, or no embedder is configured.
    Failed(String),
}

impl DenseScores {
    pub fn distances(&self) -> Option<&HashMap<ChunkId, f32>> {
        match self { DenseScores::Scored(m) => Some(m), DenseScores::Failed(_) => None }
    }
}

pub struct DenseScorer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    embed_timeout: Duration,
    search_timeout: Duration,
}

impl DenseScorer {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, embed_timeout: Duration, search_timeout: Duration) -> Self {
        Self { embedder, index, embed_timeout, search_timeout }
    }

    /// Embed every query, average into one vector and run a single filtered
    /// nearest-neighbour search for `k` hits. Never errors; failures are logged
    /// and reported as `DenseScores::Failed`.
    pub async fn score(&self, queries: &[String], k: usize, filter: &SearchFilter) -> DenseScores {
        match self.try_score(queries, k, filter).await {
            Ok(distances) => {
                tracing::debug!(k, hits = distances.len(), "dense scoring done");
                DenseScores::Scored(distances)
            }
            Err(e) => {
                tracing::warn!(error = %e, "dense scoring failed");
                DenseScores::Failed(e.to_string())
            }
        }
    }

    async fn try_score(&self, queries: &[String], k: usize, filter: &SearchFilter) -> Result<HashMap<ChunkId, f32>> {
        let vectors = bounded("embedding", self.embed_timeout, self.embedder.embed_batch(queries)).await?;
        if vectors.len() != queries.len() {
            bail!("embedder returned {} vectors for {} queries", vectors.len(), queries.len());
        }
        let query_vec = mean_vector(&vectors)?;
        let hits = bounded("vector_search", self.search_timeout, self.index.search(&query_vec, k, filter)).await?;
        let mut distances = HashMap::with_capacity(hits.len());
        for hit in hits {
            if !hit.distance.is_finite() {
                tracing::warn!(chunk_id = %hit.id, "dropping hit with non-finite distance");
                continue;
            }
            distances.entry(hit.id).or_insert(hit.distance);
        }
        Ok(distances)
    }
}

/// Component-wise mean. Errors on an empty set or inconsistent lengths.
pub fn mean_vector(vectors: &[Vec<f32>]) -> Result<Vec<f32>> {
    let first = vectors.first().ok_or_else(|| anyhow!("no vectors to average"))?;
    let dim = first.len();
    if dim == 0 { bail!("empty embedding vector"); }
    let mut mean = vec![0f32; dim];
    for v in vectors {
        if v.len() != dim { bail!("inconsistent embedding lengths ({} vs {})", v.len(), dim); }
        for (m, x) in mean.iter_mut().zip(v) { *m += x; }
    }
    let n = vectors.len() as f32;
    for m in &mut mean { *m /= n; }
    Ok(mean)
}
