//! priorart-embed
//!
//! Embedding and cross-encoder capabilities: local candle models, a
//! deterministic hash embedder and an OpenAI-compatible HTTP client.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::Arc;

use priorart_core::config::{expand_path, ModelConfig};
use priorart_core::traits::{CrossEncoder, Embedder, TextGenerator};

pub mod cross_encoder;
pub mod device;
pub mod hash;
pub mod model;
pub mod openai;
pub mod pool;
pub mod tokenize;
pub mod weights;

pub use cross_encoder::CrossEncoderModel;
pub use device::select_device;
pub use hash::HashEmbedder;
pub use model::EmbeddingModel;
pub use openai::OpenAiClient;
pub use pool::masked_mean_l2;
pub use tokenize::{tokenize_batch_on_device, tokenize_pairs_on_device};

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Pick the embedding backend: hash embedder when fake embeddings are requested
/// (config or `APP_USE_FAKE_EMBEDDINGS`), the local model when `embedding_dir`
/// is set, otherwise the OpenAI API when a key is available.
pub fn get_default_embedder(config: &ModelConfig) -> Result<Arc<dyn Embedder>> {
    if config.use_fake_embeddings || env_flag("APP_USE_FAKE_EMBEDDINGS") {
        tracing::info!(dim = config.fake_embedding_dim, "using hash embedder");
        return Ok(Arc::new(HashEmbedder::new(config.fake_embedding_dim)?));
    }
    if let Some(dir) = resolve_model_dir(config.embedding_dir.as_deref(), "APP_MODEL_DIR") {
        return Ok(Arc::new(EmbeddingModel::load(&dir, config.max_len)?));
    }
    if let Some(client) = OpenAiClient::from_env(config) {
        tracing::info!(model = %config.openai_embedding_model, "using OpenAI embeddings");
        return Ok(Arc::new(client));
    }
    Err(anyhow!("No embedding backend: set models.embedding_dir, OPENAI_API_KEY or APP_USE_FAKE_EMBEDDINGS=1"))
}

/// Local cross-encoder when `reranker_dir` (or `APP_RERANKER_DIR`) points at a model;
/// `None` disables reranking. `model_id` is the configured reranker; a directory
/// holding a different model is loaded anyway, with a warning.
pub fn get_default_cross_encoder(config: &ModelConfig, model_id: &str) -> Result<Option<Arc<dyn CrossEncoder>>> {
    match resolve_model_dir(config.reranker_dir.as_deref(), "APP_RERANKER_DIR") {
        Some(dir) => {
            match weights::model_id_of(&dir) {
                Some(found) if !weights::same_model_id(&found, model_id) => {
                    tracing::warn!(configured = model_id, found = %found, "reranker directory holds a different model");
                }
                _ => tracing::info!(model = model_id, dir = %dir.display(), "loading reranker"),
            }
            Ok(Some(Arc::new(CrossEncoderModel::load(&dir, config.max_len * 2)?)))
        }
        None => {
            tracing::info!(model = model_id, "no reranker model directory configured, reranking disabled");
            Ok(None)
        }
    }
}

/// Chat backend for query expansion; `None` when no API key is available.
pub fn get_default_generator(config: &ModelConfig) -> Option<Arc<dyn TextGenerator>> {
    let client = OpenAiClient::from_env(config)?;
    Some(Arc::new(client))
}

fn resolve_model_dir(configured: Option<&str>, env_var: &str) -> Option<PathBuf> {
    let candidate = configured.map(expand_path).or_else(|| std::env::var(env_var).ok().map(expand_path))?;
    if candidate.exists() {
        tracing::debug!(dir = %candidate.display(), "model directory resolved");
        Some(candidate)
    } else {
        tracing::warn!(dir = %candidate.display(), "model directory not found");
        None
    }
}
