use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per chunk. `cpc` holds the canonical codes as `,A,B,` so a single
/// code can be matched with `LIKE '%,A,%'`; `metadata` is the full
/// `ChunkMetadata` as JSON; `seq` is the write order.
pub fn build_chunk_schema(dim: usize) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("id", DataType::Utf8, false),
		Field::new("doc_id", DataType::Utf8, false),
		Field::new("section", DataType::Utf8, false),
		Field::new("sub_index", DataType::Int32, true),
		Field::new("text", DataType::Utf8, false),
		Field::new("cpc", DataType::Utf8, false),
		Field::new("year", DataType::Int32, true),
		Field::new("metadata", DataType::Utf8, false),
		Field::new("seq", DataType::Int64, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32), true),
	]))
}

/// Vector dimension declared by a chunk table schema.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name("vector").ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
