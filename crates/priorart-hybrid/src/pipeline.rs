//! Retrieval orchestrator: expand → lexical ∥ dense → fuse → resolve → dedup → rerank.

use std::collections::HashMap;
use std::sync::Arc;

use priorart_core::config::RetrievalConfig;
use priorart_core::error::{Error, Result};
use priorart_core::filter::SearchFilter;
use priorart_core::traits::{CorpusReader, CrossEncoder, Embedder, TextGenerator, VectorIndex};
use priorart_core::types::{Chunk, FusedResult, RetrievedChunk};
use priorart_text::{LexicalIndex, LexicalScorer, LexicalScores};

use crate::dedup::dedup_by_document;
use crate::dense::{DenseScorer, DenseScores};
use crate::expansion::QueryExpander;
use crate::fusion::{fuse, FusionWeights};
use crate::rerank::Reranker;
use crate::timeout::bounded;

pub struct RetrievalPipeline {
    lexical: Arc<LexicalScorer>,
    corpus: Arc<dyn CorpusReader>,
    dense: Option<DenseScorer>,
    expander: QueryExpander,
    reranker: Reranker,
    weights: FusionWeights,
    config: RetrievalConfig,
}

#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    lexical: Option<Arc<LexicalScorer>>,
    corpus: Option<Arc<dyn CorpusReader>>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn TextGenerator>>,
    cross_encoder: Option<Arc<dyn CrossEncoder>>,
    config: RetrievalConfig,
}

impl RetrievalPipelineBuilder {
    pub fn lexical(mut self, scorer: Arc<LexicalScorer>) -> Self { self.lexical = Some(scorer); self }
    pub fn corpus(mut self, corpus: Arc<dyn CorpusReader>) -> Self { self.corpus = Some(corpus); self }
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self { self.vector_index = Some(index); self }
    pub fn embedder(mut self, embedder: Option<Arc<dyn Embedder>>) -> Self { self.embedder = embedder; self }
    pub fn text_generator(mut self, generator: Option<Arc<dyn TextGenerator>>) -> Self { self.generator = generator; self }
    pub fn cross_encoder(mut self, encoder: Option<Arc<dyn CrossEncoder>>) -> Self { self.cross_encoder = encoder; self }
    pub fn config(mut self, config: RetrievalConfig) -> Self { self.config = config; self }

    pub fn build(self) -> Result<RetrievalPipeline> {
        self.config.validate()?;
        let lexical = self.lexical.ok_or_else(|| Error::InvalidConfig("lexical scorer is required".into()))?;
        let corpus = self.corpus.ok_or_else(|| Error::InvalidConfig("corpus reader is required".into()))?;
        let vector_index = self.vector_index.ok_or_else(|| Error::InvalidConfig("vector index is required".into()))?;
        let t = &self.config.timeouts;
        let dense = match self.embedder {
            Some(embedder) => Some(DenseScorer::new(embedder, vector_index, t.embedding(), t.vector_search())),
            None => {
                tracing::warn!("no embedder configured, dense signal disabled");
                None
            }
        };
        let expander = QueryExpander::new(self.generator, self.config.expansion_count, t.expansion());
        let reranker = Reranker::new(self.cross_encoder, t.rerank());
        tracing::info!(
            dense = dense.is_some(),
            expansion = expander.is_enabled(),
            rerank = reranker.is_enabled(),
            "retrieval pipeline ready"
        );
        Ok(RetrievalPipeline { lexical, corpus, dense, expander, reranker, weights: FusionWeights::from(&self.config), config: self.config })
    }
}

impl RetrievalPipeline {
    pub fn builder() -> RetrievalPipelineBuilder { RetrievalPipelineBuilder::default() }

    pub fn config(&self) -> &RetrievalConfig { &self.config }

    pub fn lexical(&self) -> &Arc<LexicalScorer> { &self.lexical }

    pub fn reranking_enabled(&self) -> bool { self.reranker.is_enabled() }

    /// Rebuild the lexical model from the corpus reader. Concurrent retrievals
    /// keep using the previous model until the swap.
    pub async fn rebuild_lexical(&self) -> Result<usize> {
        let chunks = bounded("corpus", self.config.timeouts.corpus(), self.corpus.get_all())
            .await
            .map_err(|e| Error::Operation(format!("reading corpus failed: {e:#}")))?;
        let lexical = Arc::clone(&self.lexical);
        tokio::task::spawn_blocking(move || lexical.rebuild_from_chunks(chunks))
            .await
            .map_err(|e| Error::Operation(format!("lexical rebuild task failed: {e}")))?
            .map_err(|e| Error::Operation(format!("lexical rebuild failed: {e:#}")))
    }

    /// Ranked shortlist of at most `desired_count` chunks, one per document,
    /// each satisfying `filter`.
    ///
    /// Errors with `InvalidFilter`/`InvalidRequest` before doing any work, and
    /// with `RetrievalUnavailable` when both signals came back empty without a
    /// filter to explain it. An empty `Ok` means nothing matched the filter.
    pub async fn retrieve(&self, query: &str, filter: &SearchFilter, desired_count: usize) -> Result<Vec<RetrievedChunk>> {
        filter.validate()?;
        if query.trim().is_empty() { return Err(Error::InvalidRequest("query must not be blank".into())); }
        if desired_count == 0 { return Err(Error::InvalidRequest("desired_count must be at least 1".into())); }

        let candidate_count = desired_count.saturating_mul(self.config.rerank_headroom);
        let k = candidate_count.saturating_mul(self.config.dense_candidate_multiplier);

        let queries = self.expander.expand(query).await;
        let (lexical, dense) = tokio::join!(self.score_lexical(&queries, filter), self.score_dense(&queries, k, filter));

        if let LexicalScores::Unavailable(lex_reason) = &lexical {
            // An unfiltered search that finds nothing means the index holds nothing.
            let dense_reason = match &dense {
                DenseScores::Failed(reason) => Some(reason.clone()),
                DenseScores::Scored(m) if m.is_empty() && filter.is_empty() => Some("vector index returned no candidates".to_string()),
                DenseScores::Scored(_) => None,
            };
            if let Some(dense_reason) = dense_reason {
                tracing::warn!(lexical = %lex_reason, dense = %dense_reason, "both retrieval signals unavailable");
                return Err(Error::RetrievalUnavailable { lexical: lex_reason.clone(), dense: dense_reason });
            }
        }

        let snapshot = self.lexical.snapshot();
        let fused = fuse(lexical.scores(), dense.distances(), self.weights, |id| snapshot.as_ref().and_then(|s| s.position(id)));
        tracing::debug!(queries = queries.len(), fused = fused.len(), "fusion done");

        let candidates = self.resolve(fused, snapshot.as_deref(), filter, candidate_count).await;
        tracing::debug!(candidates = candidates.len(), "deduplicated");

        let results = self.reranker.rerank(query, candidates, desired_count).await;
        tracing::debug!(results = results.len(), "retrieval done");
        Ok(results)
    }

    async fn score_lexical(&self, queries: &[String], filter: &SearchFilter) -> LexicalScores {
        let lexical = Arc::clone(&self.lexical);
        let queries = queries.to_vec();
        let filter = filter.clone();
        match tokio::task::spawn_blocking(move || lexical.score(&queries, &filter)).await {
            Ok(scores) => {
                if let LexicalScores::Unavailable(reason) = &scores { tracing::warn!(reason = %reason, "lexical signal unavailable"); }
                scores
            }
            Err(e) => LexicalScores::Unavailable(format!("lexical task failed: {e}")),
        }
    }

    async fn score_dense(&self, queries: &[String], k: usize, filter: &SearchFilter) -> DenseScores {
        match &self.dense {
            Some(dense) => dense.score(queries, k, filter).await,
            None => DenseScores::Failed("no embedder configured".into()),
        }
    }

    /// Attach chunk records to fused ids (lexical model first, corpus reader for
    /// the rest), drop anything failing `filter`, and dedup by document.
    async fn resolve(&self, fused: Vec<FusedResult>, snapshot: Option<&LexicalIndex>, filter: &SearchFilter, limit: usize) -> Vec<RetrievedChunk> {
        let missing: Vec<String> = fused
            .iter()
            .filter(|f| snapshot.and_then(|s| s.chunk(&f.id)).is_none())
            .map(|f| f.id.clone())
            .collect();
        let fetched: HashMap<String, Chunk> = if missing.is_empty() {
            HashMap::new()
        } else {
            match bounded("corpus", self.config.timeouts.corpus(), self.corpus.get_by_ids(&missing)).await {
                Ok(chunks) => chunks.into_iter().map(|c| (c.id.clone(), c)).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, missing = missing.len(), "chunk lookup failed, dropping unresolved candidates");
                    HashMap::new()
                }
            }
        };

        let resolved = fused.into_iter().filter_map(|f| {
            let chunk = snapshot.and_then(|s| s.chunk(&f.id)).or_else(|| fetched.get(&f.id))?;
            if !filter.matches(&chunk.metadata) {
                tracing::warn!(chunk_id = %f.id, "candidate fails filter, dropped");
                return None;
            }
            Some(RetrievedChunk::from_chunk(chunk.clone(), f.score))
        });
        dedup_by_document(resolved, |c| c.doc_id.as_str(), limit)
    }
}
