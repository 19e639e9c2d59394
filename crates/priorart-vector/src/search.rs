use anyhow::{anyhow, Context, Result};
use arrow_array::{Array, Float32Array, Int32Array, Int64Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use std::path::Path;

use priorart_core::filter::SearchFilter;
use priorart_core::traits::{CorpusReader, VectorIndex};
use priorart_core::types::{Chunk, ChunkMetadata, Section, VectorHit};

use crate::filter::{id_list_predicate, to_predicate};
use crate::schema::vector_dim;
use crate::table::{ensure_table, open_db};
use crate::writer::ChunkWriter;

/// Chunk table served both as the vector index and as the corpus reader.
#[derive(Clone)]
pub struct LanceVectorIndex { table: lancedb::Table, dim: usize }

impl LanceVectorIndex {
	pub async fn open(path: &Path, table_name: &str, dim: usize) -> Result<Self> {
		let conn = open_db(path).await?;
		let table = ensure_table(&conn, table_name, dim).await?;
		let schema = table.schema().await?;
		let stored = vector_dim(&schema).ok_or_else(|| anyhow!("table '{}' has no vector column", table_name))?;
		if stored != dim {
			return Err(anyhow!("table '{}' stores {}-dim vectors, expected {}", table_name, stored, dim));
		}
		Ok(Self { table, dim })
	}

	pub fn dim(&self) -> usize { self.dim }

	pub fn writer(&self) -> ChunkWriter { ChunkWriter::new(self.table.clone(), self.dim) }

	pub async fn count(&self) -> Result<usize> { Ok(self.table.count_rows(None).await?) }

	async fn scan(&self, predicate: Option<String>) -> Result<Vec<(i64, Chunk)>> {
		let total = self.count().await?;
		if total == 0 { return Ok(Vec::new()); }
		let mut query = self.table.query().limit(total);
		if let Some(p) = predicate { query = query.only_if(p); }
		let batches: Vec<RecordBatch> = query.execute().await.context("Failed to scan lancedb table")?.try_collect().await?;
		let mut rows = Vec::new();
		for batch in &batches { rows.extend(batch_to_chunks(batch)?); }
		rows.sort_by_key(|(seq, _)| *seq);
		Ok(rows)
	}
}

#[async_trait]
impl VectorIndex for LanceVectorIndex {
	async fn search(&self, query_vec: &[f32], k: usize, filter: &SearchFilter) -> Result<Vec<VectorHit>> {
		if query_vec.len() != self.dim {
			return Err(anyhow!("Query vector dim mismatch: expected {}, got {}", self.dim, query_vec.len()));
		}
		if k == 0 { return Ok(Vec::new()); }
		let mut query = self.table.query().nearest_to(query_vec).context("Failed to create lancedb nearest_to query")?.limit(k);
		if let Some(p) = to_predicate(filter) { query = query.only_if(p); }
		let batches: Vec<RecordBatch> = query.execute().await.context("Failed to execute lancedb query")?.try_collect().await?;

		let mut hits = Vec::new();
		for batch in &batches {
			let ids = string_col(batch, "id")?;
			let distances = batch
				.column_by_name("_distance")
				.or_else(|| batch.column_by_name("distance"))
				.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
				.ok_or_else(|| anyhow!("Missing _distance column in lancedb result"))?;
			for i in 0..batch.num_rows() {
				hits.push(VectorHit { id: ids.value(i).to_string(), distance: distances.value(i) });
			}
		}
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		tracing::debug!(k, hits = hits.len(), "vector search done");
		Ok(hits)
	}
}

#[async_trait]
impl CorpusReader for LanceVectorIndex {
	async fn get_all(&self) -> Result<Vec<Chunk>> {
		Ok(self.scan(None).await?.into_iter().map(|(_, c)| c).collect())
	}

	async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Chunk>> {
		if ids.is_empty() { return Ok(Vec::new()); }
		let mut found: std::collections::HashMap<String, Chunk> =
			self.scan(Some(id_list_predicate(ids))).await?.into_iter().map(|(_, c)| (c.id.clone(), c)).collect();
		Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
	}
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.ok_or_else(|| anyhow!("Missing {} column in lancedb result", name))?
		.as_any()
		.downcast_ref::<StringArray>()
		.ok_or_else(|| anyhow!("{} column is not StringArray", name))
}

fn int32_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<Int32Array>())
		.ok_or_else(|| anyhow!("{} column missing or not Int32Array", name))
}

fn batch_to_chunks(batch: &RecordBatch) -> Result<Vec<(i64, Chunk)>> {
	let ids = string_col(batch, "id")?;
	let doc_ids = string_col(batch, "doc_id")?;
	let sections = string_col(batch, "section")?;
	let texts = string_col(batch, "text")?;
	let metadata = string_col(batch, "metadata")?;
	let sub_index = int32_col(batch, "sub_index")?;
	let seq = batch
		.column_by_name("seq")
		.and_then(|c| c.as_any().downcast_ref::<Int64Array>())
		.ok_or_else(|| anyhow!("seq column missing or not Int64Array"))?;

	let mut out = Vec::with_capacity(batch.num_rows());
	for i in 0..batch.num_rows() {
		let meta: ChunkMetadata = serde_json::from_str(metadata.value(i))
			.with_context(|| format!("bad metadata json for chunk {}", ids.value(i)))?;
		let chunk = Chunk {
			id: ids.value(i).to_string(),
			doc_id: doc_ids.value(i).to_string(),
			section: Section::parse(sections.value(i)).unwrap_or_default(),
			sub_index: if sub_index.is_null(i) { None } else { u32::try_from(sub_index.value(i)).ok() },
			text: texts.value(i).to_string(),
			metadata: meta,
		};
		out.push((seq.value(i), chunk));
	}
	Ok(out)
}
