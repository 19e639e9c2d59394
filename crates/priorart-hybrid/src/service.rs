//! Wiring a pipeline from configuration at service start.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use priorart_core::config::{resolve_with_base, Config};
use priorart_core::traits::{CorpusReader, VectorIndex};
use priorart_embed::{get_default_cross_encoder, get_default_embedder, get_default_generator};
use priorart_text::LexicalScorer;
use priorart_vector::LanceVectorIndex;

use crate::pipeline::RetrievalPipeline;

/// Open the chunk table, load the configured models and build the lexical
/// model from the stored corpus. An unusable embedding backend disables the
/// dense signal and an unloadable reranker disables reranking; neither fails
/// startup.
pub async fn open_pipeline(config: &Config, base_dir: &Path) -> Result<RetrievalPipeline> {
    let retrieval = config.retrieval()?;
    let models = config.models()?;
    let storage = config.storage()?;

    let embedder = match get_default_embedder(&models) {
        Ok(e) => Some(e),
        Err(e) => {
            tracing::warn!(error = %e, "embedding backend unavailable");
            None
        }
    };
    let dim = embedder.as_ref().map_or(models.fake_embedding_dim, |e| e.dim());

    let cross_encoder = match get_default_cross_encoder(&models, &retrieval.reranker_model) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "reranker failed to load, reranking disabled");
            None
        }
    };

    let db_path = resolve_with_base(base_dir, &storage.vector_db);
    let index = Arc::new(LanceVectorIndex::open(&db_path, &storage.table, dim).await.context("Failed to open vector store")?);
    let lexical = Arc::new(LexicalScorer::from_corpus(index.as_ref()).await.context("Failed to build lexical model")?);

    let corpus: Arc<dyn CorpusReader> = index.clone();
    let vector_index: Arc<dyn VectorIndex> = index;
    let pipeline = RetrievalPipeline::builder()
        .lexical(lexical)
        .corpus(corpus)
        .vector_index(vector_index)
        .embedder(embedder)
        .text_generator(get_default_generator(&models))
        .cross_encoder(cross_encoder)
        .config(retrieval)
        .build()?;
    Ok(pipeline)
}
