use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use std::collections::HashMap;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::tokenize::configure_truncation;

/// Parse `config.json` of a HuggingFace model directory.
pub fn read_model_config<T: serde::de::DeserializeOwned>(model_dir: &Path) -> Result<T> {
    let config_path = model_dir.join("config.json");
    let text = std::fs::read_to_string(&config_path).with_context(|| format!("Failed to read {}", config_path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", config_path.display()))
}

/// Model id a directory holds: `_name_or_path` from `config.json`, else the
/// directory name.
pub fn model_id_of(model_dir: &Path) -> Option<String> {
    let recorded = read_model_config::<serde_json::Value>(model_dir)
        .ok()
        .and_then(|v| v.get("_name_or_path").and_then(|n| n.as_str()).map(str::to_string))
        .filter(|n| !n.trim().is_empty());
    recorded.or_else(|| model_dir.file_name().map(|n| n.to_string_lossy().into_owned()))
}

/// Ids are compared by their last path segment, case-insensitively, so
/// `BAAI/bge-reranker-large` matches a local `models/bge-reranker-large`.
pub fn same_model_id(a: &str, b: &str) -> bool {
    let tail = |s: &str| s.trim().trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_ascii_lowercase();
    tail(a) == tail(b)
}

pub fn load_tokenizer(model_dir: &Path, max_len: usize) -> Result<Tokenizer> {
    let tokenizer_path = model_dir.join("tokenizer.json");
    let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
        .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
    configure_truncation(&mut tokenizer, max_len)?;
    Ok(tokenizer)
}

/// Prefer `model.safetensors`; fall back to a PyTorch pickle (`pytorch_model.bin`).
pub fn load_var_builder(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let dtype = DType::F32;
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        tracing::debug!(path = %safetensors.display(), "loading safetensors weights");
        // SAFETY: the file is mapped read-only and not modified while the model lives.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], dtype, device)? };
        return Ok(vb);
    }
    let weights_path = model_dir.join("pytorch_model.bin");
    if !weights_path.exists() {
        return Err(anyhow!("Missing model.safetensors or pytorch_model.bin in {}", model_dir.display()));
    }
    tracing::debug!(path = %weights_path.display(), "loading pytorch weights");
    let weights = candle_core::pickle::read_all(&weights_path)?;
    let weights_map: HashMap<String, candle_core::Tensor> = weights.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights_map, dtype, device))
}
