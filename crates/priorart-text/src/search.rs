//! priorart-text
//!
//! Lexical relevance signal. `LexicalScorer` owns the current `LexicalIndex`
//! and swaps in a freshly built one on rebuild; in-flight queries keep the
//! snapshot they started with.
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use priorart_core::filter::SearchFilter;
use priorart_core::traits::CorpusReader;
use priorart_core::types::{Chunk, ChunkId};

use crate::index::LexicalIndex;

/// Outcome of lexical scoring for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum LexicalScores {
	/// No model could score the request (empty corpus, never built, scoring error).
	Unavailable(String),
	/// Summed scores of every filter-passing chunk, 0 for non-matching ones.
	Scored(HashMap<ChunkId, f32>),
}

impl LexicalScores {
	pub fn is_available(&self) -> bool { matches!(self, LexicalScores::Scored(_)) }

	pub fn scores(&self) -> Option<&HashMap<ChunkId, f32>> {
		match self { LexicalScores::Scored(m) => Some(m), LexicalScores::Unavailable(_) => None }
	}
}

#[derive(Default)]
pub struct LexicalScorer {
	current: RwLock<Option<Arc<LexicalIndex>>>,
}

impl LexicalScorer {
	/// Scorer with no model yet; every request is `Unavailable` until rebuilt.
	pub fn empty() -> Self { Self::default() }

	pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
		let scorer = Self::empty();
		scorer.rebuild_from_chunks(chunks)?;
		Ok(scorer)
	}

	pub async fn from_corpus(corpus: &dyn CorpusReader) -> Result<Self> {
		let scorer = Self::empty();
		scorer.rebuild(corpus).await?;
		Ok(scorer)
	}

	/// Read the full corpus and replace the model. The old model keeps serving
	/// until the new one is ready; a failed rebuild leaves it in place.
	pub async fn rebuild(&self, corpus: &dyn CorpusReader) -> Result<usize> {
		let chunks = corpus.get_all().await?;
		self.rebuild_from_chunks(chunks)
	}

	pub fn rebuild_from_chunks(&self, chunks: Vec<Chunk>) -> Result<usize> {
		let built = Arc::new(LexicalIndex::build(chunks)?);
		let n = built.len();
		let mut slot = self.current.write().unwrap_or_else(|e| e.into_inner());
		*slot = Some(built);
		tracing::info!(chunks = n, "lexical model rebuilt");
		Ok(n)
	}

	/// Current model, if any. Cheap: clones the `Arc`.
	pub fn snapshot(&self) -> Option<Arc<LexicalIndex>> {
		self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
	}

	pub fn score(&self, queries: &[String], filter: &SearchFilter) -> LexicalScores {
		let Some(index) = self.snapshot() else {
			return LexicalScores::Unavailable("lexical model not built".into());
		};
		if index.is_empty() {
			return LexicalScores::Unavailable("corpus is empty".into());
		}
		match index.score(queries, filter) {
			Ok(scores) => {
				tracing::debug!(queries = queries.len(), candidates = scores.len(), "lexical scoring done");
				LexicalScores::Scored(scores)
			}
			Err(e) => {
				tracing::warn!(error = %e, "lexical scoring failed");
				LexicalScores::Unavailable(format!("lexical scoring failed: {e}"))
			}
		}
	}
}
