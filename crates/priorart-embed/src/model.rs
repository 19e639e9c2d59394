use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;

use priorart_core::traits::Embedder;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_batch_on_device;
use crate::weights::{load_tokenizer, load_var_builder, read_model_config};

struct Inner { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, dim: usize }

/// Local XLM-RoBERTa sentence embedder (BGE-M3 style: masked mean pooling, L2 norm).
/// Inference is CPU/GPU bound and runs on tokio's blocking pool.
#[derive(Clone)]
pub struct EmbeddingModel { inner: Arc<Inner> }

impl EmbeddingModel {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer = load_tokenizer(model_dir, max_len)?;
        let config: XLMRobertaConfig = read_model_config(model_dir)?;
        let dim = config.hidden_size;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaModel::new(&config, vb).context("Failed to build XLM-RoBERTa model")?;
        tracing::info!(dim, "embedding model loaded");
        Ok(Self { inner: Arc::new(Inner { model, tokenizer, device, dim }) })
    }

    pub fn dim(&self) -> usize { self.inner.dim }

    /// Synchronous batch embedding; one forward pass for the whole batch.
    pub fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let inner = &self.inner;
        let (input_ids, attention_mask) = tokenize_batch_on_device(&inner.tokenizer, texts, &inner.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden_states = inner.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden_states, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        if start.elapsed().as_millis() > 500 {
            tracing::warn!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "slow embedding batch");
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for EmbeddingModel {
    fn dim(&self) -> usize { self.inner.dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let this = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || this.embed_batch_blocking(&texts))
            .await
            .map_err(|e| anyhow!("embedding task failed: {}", e))?
    }
}
