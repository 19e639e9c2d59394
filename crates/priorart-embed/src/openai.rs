//! OpenAI-compatible HTTP client: `/embeddings` and `/chat/completions`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use priorart_core::config::ModelConfig;
use priorart_core::traits::{Embedder, TextGenerator};

const API_KEY_VAR: &str = "OPENAI_API_KEY";
const SYSTEM_PROMPT: &str = "You are a search query generator. Generate diverse search queries.";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    embedding_dim: usize,
    chat_model: String,
    temperature: f32,
    max_tokens: usize,
}

impl OpenAiClient {
    pub fn new(config: &ModelConfig, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: config.openai_embedding_model.clone(),
            embedding_dim: config.openai_embedding_dim,
            chat_model: config.openai_chat_model.clone(),
            temperature: 0.7,
            max_tokens: 200,
        }
    }

    /// Build from `OPENAI_API_KEY`; `None` when the variable is unset or blank.
    pub fn from_env(config: &ModelConfig) -> Option<Self> {
        let key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(config, key))
    }

    fn chat_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.chat_model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("OpenAI request to {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("OpenAI {path} returned {status}: {}", text.chars().take(200).collect::<String>());
        }
        Ok(response)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let parsed: ChatResponse = self.post("chat/completions", self.chat_body(prompt)).await?.json().await.context("Failed to parse chat response")?;
        chat_text(parsed)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    fn dim(&self) -> usize { self.embedding_dim }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let body = serde_json::json!({ "model": self.embedding_model, "input": texts });
        let parsed: EmbeddingResponse = self.post("embeddings", body).await?.json().await.context("Failed to parse embedding response")?;
        embedding_vectors(parsed, texts.len())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse { choices: Vec<ChatChoice> }

#[derive(Debug, Deserialize)]
struct ChatChoice { message: ChatMessage }

#[derive(Debug, Deserialize)]
struct ChatMessage { #[serde(default)] content: Option<String> }

#[derive(Debug, Deserialize)]
struct EmbeddingResponse { data: Vec<EmbeddingDatum> }

#[derive(Debug, Deserialize)]
struct EmbeddingDatum { #[serde(default)] index: usize, embedding: Vec<f32> }

fn chat_text(resp: ChatResponse) -> Result<String> {
    resp.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("chat response has no content"))
}

/// Vectors ordered by their `index` field; count must match the request.
fn embedding_vectors(resp: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut data = resp.data;
    if data.len() != expected { bail!("expected {expected} embeddings, got {}", data.len()); }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}
