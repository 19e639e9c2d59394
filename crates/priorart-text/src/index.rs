use anyhow::{Context, Result};
use std::collections::HashMap;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use priorart_core::filter::SearchFilter;
use priorart_core::types::{Chunk, ChunkId, ScoredCandidate};

use crate::tantivy_utils::{analyze, build_schema, register_tokenizer};

/// Immutable BM25 model over one corpus snapshot.
///
/// Lives entirely in RAM. Besides the tantivy index it keeps every chunk
/// record and its corpus insertion position, which later stages use for
/// record lookup and as the deterministic tie-breaker.
pub struct LexicalIndex {
	index: Index,
	reader: IndexReader,
	id_field: Field,
	text_field: Field,
	chunks: Vec<Chunk>,
	positions: HashMap<ChunkId, usize>,
}

impl LexicalIndex {
	pub fn build(chunks: Vec<Chunk>) -> Result<Self> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let id_field = schema.get_field("id")?;
		let text_field = schema.get_field("text")?;

		let mut kept = Vec::with_capacity(chunks.len());
		let mut positions = HashMap::with_capacity(chunks.len());
		let mut index_writer: IndexWriter<TantivyDocument> = index.writer_with_num_threads(1, 50_000_000).context("Failed to create tantivy writer")?;
		for c in chunks {
			if positions.contains_key(&c.id) {
				tracing::warn!(chunk_id = %c.id, "duplicate chunk id in corpus, keeping first occurrence");
				continue;
			}
			index_writer.add_document(doc!(
				id_field => c.id.clone(),
				text_field => c.text.clone(),
			))?;
			positions.insert(c.id.clone(), kept.len());
			kept.push(c);
		}
		index_writer.commit().context("Failed to commit lexical index")?;

		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().context("Failed to open lexical index reader")?;
		Ok(Self { index, reader, id_field, text_field, chunks: kept, positions })
	}

	pub fn len(&self) -> usize { self.chunks.len() }

	pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

	/// Corpus insertion position of `id`.
	pub fn position(&self, id: &str) -> Option<usize> { self.positions.get(id).copied() }

	pub fn chunk(&self, id: &str) -> Option<&Chunk> { self.position(id).map(|p| &self.chunks[p]) }

	pub fn chunks(&self) -> &[Chunk] { &self.chunks }

	/// BM25 scores of a single query; only chunks sharing at least one term
	/// with the query are returned.
	pub fn score_query(&self, query: &str) -> Result<Vec<ScoredCandidate>> {
		let terms = analyze(&self.index, self.text_field, query)?;
		if terms.is_empty() || self.chunks.is_empty() { return Ok(Vec::new()); }
		// One SHOULD clause per query token; repeated tokens count repeatedly.
		let clauses: Vec<(Occur, Box<dyn Query>)> = terms
			.iter()
			.map(|t| {
				let term = Term::from_field_text(self.text_field, t);
				(Occur::Should, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
			})
			.collect();
		let q = BooleanQuery::new(clauses);
		let searcher = self.reader.searcher();
		let top_docs = searcher.search(&q, &TopDocs::with_limit(self.chunks.len()))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			if let Some(id) = doc.get_first(self.id_field).and_then(|v| v.as_str()) {
				hits.push(ScoredCandidate { id: id.to_string(), score });
			}
		}
		Ok(hits)
	}

	/// Scores for every chunk passing `filter`, summed over `queries`.
	/// Chunks that match no query term are present with score 0.
	pub fn score(&self, queries: &[String], filter: &SearchFilter) -> Result<HashMap<ChunkId, f32>> {
		let mut scores: HashMap<ChunkId, f32> = self
			.chunks
			.iter()
			.filter(|c| filter.matches(&c.metadata))
			.map(|c| (c.id.clone(), 0.0))
			.collect();
		for q in queries {
			for hit in self.score_query(q)? {
				if let Some(total) = scores.get_mut(&hit.id) { *total += hit.score.max(0.0); }
			}
		}
		Ok(scores)
	}
}
