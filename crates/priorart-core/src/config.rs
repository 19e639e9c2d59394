//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars.
//! Typed sections (`[retrieval]`, `[models]`) fall back to their defaults when
//! absent. Provides helpers to expand `~` and `${VAR}` and to resolve relative
//! paths against a known base directory.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Wrap an already-assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn retrieval(&self) -> anyhow::Result<RetrievalConfig> {
        self.section("retrieval")
    }

    pub fn models(&self) -> anyhow::Result<ModelConfig> {
        self.section("models")
    }

    pub fn storage(&self) -> anyhow::Result<StorageConfig> {
        self.section("storage")
    }

    fn section<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.figment.extract_inner::<T>(key) {
            Ok(v) => Ok(v),
            Err(e) if e.missing() && self.figment.find_value(key).is_err() => Ok(T::default()),
            Err(e) => Err(anyhow::anyhow!("Failed to get '{}': {}", key, e)),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.retrieval()?.validate()?;
        Ok(())
    }
}

/// Tunables of the retrieval pipeline. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub lexical_weight: f32,
    pub dense_weight: f32,
    /// Extra query variants requested from the text generator.
    pub expansion_count: usize,
    /// Candidates kept after dedup = desired_count * rerank_headroom.
    pub rerank_headroom: usize,
    /// Vector search k = candidates * dense_candidate_multiplier.
    pub dense_candidate_multiplier: usize,
    /// Expected cross-encoder id, checked against the model in `[models] reranker_dir`.
    pub reranker_model: String,
    pub timeouts: TimeoutConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            lexical_weight: 0.4,
            dense_weight: 0.6,
            expansion_count: 3,
            rerank_headroom: 5,
            dense_candidate_multiplier: 2,
            reranker_model: "BAAI/bge-reranker-large".to_string(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let weights_ok = |w: f32| w.is_finite() && w >= 0.0;
        if !weights_ok(self.lexical_weight) || !weights_ok(self.dense_weight) {
            return Err(Error::InvalidConfig(format!(
                "fusion weights must be finite and non-negative (lexical={}, dense={})",
                self.lexical_weight, self.dense_weight
            )));
        }
        if self.lexical_weight + self.dense_weight <= 0.0 {
            return Err(Error::InvalidConfig("fusion weights must not both be zero".into()));
        }
        if self.rerank_headroom == 0 {
            return Err(Error::InvalidConfig("rerank_headroom must be at least 1".into()));
        }
        if self.dense_candidate_multiplier == 0 {
            return Err(Error::InvalidConfig(
                "dense_candidate_multiplier must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Per-capability timeouts in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub expansion_ms: u64,
    pub embedding_ms: u64,
    pub vector_search_ms: u64,
    pub rerank_ms: u64,
    pub corpus_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            expansion_ms: 10_000,
            embedding_ms: 10_000,
            vector_search_ms: 5_000,
            rerank_ms: 30_000,
            corpus_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn expansion(&self) -> Duration { Duration::from_millis(self.expansion_ms) }
    pub fn embedding(&self) -> Duration { Duration::from_millis(self.embedding_ms) }
    pub fn vector_search(&self) -> Duration { Duration::from_millis(self.vector_search_ms) }
    pub fn rerank(&self) -> Duration { Duration::from_millis(self.rerank_ms) }
    pub fn corpus(&self) -> Duration { Duration::from_millis(self.corpus_ms) }
}

/// Where local models live and which backends to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub embedding_dir: Option<String>,
    pub reranker_dir: Option<String>,
    pub use_fake_embeddings: bool,
    pub fake_embedding_dim: usize,
    pub max_len: usize,
    pub openai_base_url: String,
    pub openai_embedding_model: String,
    pub openai_embedding_dim: usize,
    pub openai_chat_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_dir: None,
            reranker_dir: None,
            use_fake_embeddings: false,
            fake_embedding_dim: 1024,
            max_len: 256,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_embedding_model: "text-embedding-3-large".to_string(),
            openai_embedding_dim: 3072,
            openai_chat_model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Location of the chunk table written by the ingestion step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// LanceDB directory; relative paths resolve against the working directory.
    pub vector_db: String,
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { vector_db: "data/lancedb".to_string(), table: "chunks".to_string() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(s: &str) -> anyhow::Result<Config> {
        Config::from_figment(Figment::new().merge(Toml::string(s)))
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.retrieval().unwrap(), RetrievalConfig::default());
        assert_eq!(config.models().unwrap(), ModelConfig::default());
        assert_eq!(config.storage().unwrap().table, "chunks");
    }

    #[test]
    fn partial_section_overrides_only_given_keys() {
        let config = from_toml(
            "[retrieval]\nlexical_weight = 0.5\ndense_weight = 0.5\n[retrieval.timeouts]\nrerank_ms = 100\n",
        )
        .unwrap();
        let r = config.retrieval().unwrap();
        assert_eq!(r.lexical_weight, 0.5);
        assert_eq!(r.expansion_count, 3);
        assert_eq!(r.timeouts.rerank(), Duration::from_millis(100));
        assert_eq!(r.timeouts.corpus_ms, 10_000);
    }

    #[test]
    fn rejects_zero_headroom() {
        assert!(from_toml("[retrieval]\nrerank_headroom = 0\n").is_err());
    }

    #[test]
    fn resolves_relative_paths_against_base() {
        let base = Path::new("/srv/priorart");
        assert_eq!(resolve_with_base(base, "index"), PathBuf::from("/srv/priorart/index"));
        assert_eq!(resolve_with_base(base, "/abs/index"), PathBuf::from("/abs/index"));
    }
}
