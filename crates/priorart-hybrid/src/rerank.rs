use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;

use priorart_core::traits::CrossEncoder;
use priorart_core::types::RetrievedChunk;

use crate::timeout::bounded;

/// Optional cross-encoder pass. Membership never changes beyond truncation.
pub struct Reranker {
    encoder: Option<Arc<dyn CrossEncoder>>,
    timeout: Duration,
}

impl Reranker {
    pub fn new(encoder: Option<Arc<dyn CrossEncoder>>, timeout: Duration) -> Self { Self { encoder, timeout } }

    pub fn disabled() -> Self { Self::new(None, Duration::ZERO) }

    pub fn is_enabled(&self) -> bool { self.encoder.is_some() }

    /// Order `candidates` by cross-encoder relevance to `query` and keep `top_k`.
    /// Without an encoder, or when scoring fails, returns the input truncated.
    pub async fn rerank(&self, query: &str, mut candidates: Vec<RetrievedChunk>, top_k: usize) -> Vec<RetrievedChunk> {
        let Some(encoder) = &self.encoder else {
            candidates.truncate(top_k);
            return candidates;
        };
        if candidates.is_empty() { return candidates; }
        match self.scores(encoder.as_ref(), query, &candidates).await {
            Ok(scores) => {
                let mut scored: Vec<(f32, RetrievedChunk)> = scores.into_iter().zip(candidates).collect();
                // Stable: equal scores keep fused order.
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));
                scored
                    .into_iter()
                    .take(top_k)
                    .map(|(s, mut c)| { c.rerank_score = Some(s); c })
                    .collect()
            }
            Err(e) => {
                tracing::warn!(error = %e, "reranking failed, keeping fused order");
                candidates.truncate(top_k);
                candidates
            }
        }
    }

    async fn scores(&self, encoder: &dyn CrossEncoder, query: &str, candidates: &[RetrievedChunk]) -> Result<Vec<f32>> {
        let pairs: Vec<(String, String)> = candidates.iter().map(|c| (query.to_string(), c.text.clone())).collect();
        let scores = bounded("rerank", self.timeout, encoder.score(&pairs)).await?;
        if scores.len() != candidates.len() {
            bail!("cross-encoder returned {} scores for {} candidates", scores.len(), candidates.len());
        }
        if scores.iter().any(|s| !s.is_finite()) { bail!("cross-encoder returned a non-finite score"); }
        tracing::debug!(pairs = pairs.len(), "rerank scored");
        Ok(scores)
    }
}
