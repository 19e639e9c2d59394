use anyhow::{anyhow, Context, Result};
use arrow_array::{types::Float32Type, Array, FixedSizeListArray, Int32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use std::sync::Arc;

use priorart_core::types::Chunk;

use crate::filter::{encode_cpc, id_list_predicate};
use crate::schema::build_chunk_schema;

/// Appends chunks with their vectors. Re-writing an id replaces the old row.
pub struct ChunkWriter { table: lancedb::Table, dim: usize }

impl ChunkWriter {
	pub fn new(table: lancedb::Table, dim: usize) -> Self { Self { table, dim } }

	pub async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<usize> {
		if chunks.is_empty() { return Ok(0); }
		if chunks.len() != vectors.len() {
			return Err(anyhow!("chunks and vectors length must match ({} vs {})", chunks.len(), vectors.len()));
		}
		if let Some((c, v)) = chunks.iter().zip(vectors).find(|(_, v)| v.len() != self.dim) {
			return Err(anyhow!("Vector dim mismatch for id {}: expected {}, got {}", c.id, self.dim, v.len()));
		}

		let start = self.next_seq().await?;
		let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
		self.table.delete(&id_list_predicate(&ids)).await.context("Failed to delete replaced chunks")?;
		let batch = self.to_record_batch(chunks, vectors, start)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		self.table.add(reader).execute().await.context("Failed to add chunks to lancedb table")?;
		tracing::debug!(rows = chunks.len(), "chunks written");
		Ok(chunks.len())
	}

	/// One past the highest `seq` ever stored, so replaced rows move to the end
	/// without colliding with live ones.
	async fn next_seq(&self) -> Result<i64> {
		let total = self.table.count_rows(None).await?;
		if total == 0 { return Ok(0); }
		let mut max_seq = -1i64;
		let mut stream = self.table.query().select(Select::columns(&["seq"])).limit(total).execute().await.context("Failed to scan seq column")?;
		while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
			let seq = batch
				.column_by_name("seq")
				.and_then(|c| c.as_any().downcast_ref::<Int64Array>())
				.ok_or_else(|| anyhow!("seq column missing or not Int64"))?;
			if let Some(m) = seq.iter().flatten().max() { max_seq = max_seq.max(m); }
		}
		Ok(max_seq + 1)
	}

	fn to_record_batch(&self, chunks: &[Chunk], vectors: &[Vec<f32>], start: i64) -> Result<RecordBatch> {
		let schema = build_chunk_schema(self.dim);
		let mut metadata = Vec::with_capacity(chunks.len());
		for c in chunks { metadata.push(serde_json::to_string(&c.metadata)?); }
		let seq: Vec<i64> = (0..chunks.len() as i64).map(|i| start + i).collect();
		let vectors = vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>()));
		let record_batch = RecordBatch::try_new(schema, vec![
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.section.as_str()))),
			Arc::new(Int32Array::from(chunks.iter().map(|c| c.sub_index.map(|n| n as i32)).collect::<Vec<_>>())),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.text.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| encode_cpc(&c.metadata.cpc)))),
			Arc::new(Int32Array::from(chunks.iter().map(|c| c.metadata.year).collect::<Vec<_>>())),
			Arc::new(StringArray::from(metadata)),
			Arc::new(Int64Array::from(seq)),
			Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, self.dim as i32)),
		])?;
		Ok(record_batch)
	}
}
