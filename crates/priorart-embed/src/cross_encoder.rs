use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use candle_core::Device;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaForSequenceClassification};
use tokenizers::Tokenizer;

use priorart_core::traits::CrossEncoder;

use crate::device::select_device;
use crate::tokenize::tokenize_pairs_on_device;
use crate::weights::{load_tokenizer, load_var_builder, read_model_config};

/// Pairs scored per forward pass.
const PAIR_BATCH: usize = 16;

struct Inner { model: XLMRobertaForSequenceClassification, tokenizer: Tokenizer, device: Device }

/// Local cross-encoder (bge-reranker family). Each `(query, passage)` pair is
/// encoded jointly and mapped to one relevance logit, squashed with a sigmoid.
#[derive(Clone)]
pub struct CrossEncoderModel { inner: Arc<Inner> }

impl CrossEncoderModel {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading cross-encoder");
        let tokenizer = load_tokenizer(model_dir, max_len)?;
        let config: XLMRobertaConfig = read_model_config(model_dir)?;
        let vb = load_var_builder(model_dir, &device)?;
        let model = XLMRobertaForSequenceClassification::new(1, &config, vb).context("Failed to build cross-encoder")?;
        Ok(Self { inner: Arc::new(Inner { model, tokenizer, device }) })
    }

    pub fn score_blocking(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(pairs.len());
        for batch in pairs.chunks(PAIR_BATCH) {
            let inner = &self.inner;
            let (input_ids, attention_mask) = tokenize_pairs_on_device(&inner.tokenizer, batch, &inner.device)?;
            let token_type_ids = input_ids.zeros_like()?;
            let logits = inner.model.forward(&input_ids, &attention_mask, &token_type_ids)?;
            let logits: Vec<Vec<f32>> = logits.to_device(&Device::Cpu)?.to_vec2()?;
            if logits.len() != batch.len() { bail!("cross-encoder returned {} rows for {} pairs", logits.len(), batch.len()); }
            for row in logits {
                let logit = row.first().copied().ok_or_else(|| anyhow!("cross-encoder returned an empty row"))?;
                scores.push(sigmoid(logit));
            }
        }
        Ok(scores)
    }
}

fn sigmoid(x: f32) -> f32 { 1.0 / (1.0 + (-x).exp()) }

#[async_trait]
impl CrossEncoder for CrossEncoderModel {
    async fn score(&self, pairs: &[(String, String)]) -> Result<Vec<f32>> {
        if pairs.is_empty() { return Ok(Vec::new()); }
        let this = self.clone();
        let pairs = pairs.to_vec();
        tokio::task::spawn_blocking(move || this.score_blocking(&pairs))
            .await
            .map_err(|e| anyhow!("cross-encoder task failed: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::sigmoid;

    #[test]
    fn sigmoid_is_monotone_and_centered() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(3.0) > sigmoid(1.0));
        assert!(sigmoid(-20.0) >= 0.0);
    }
}
