//! priorart-vector
//!
//! LanceDB-backed chunk store: nearest-neighbour search with structured
//! filters pushed down as SQL predicates, plus corpus reads for the lexical
//! model.
pub mod filter;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use filter::to_predicate;
pub use schema::build_chunk_schema;
pub use search::LanceVectorIndex;
pub use table::{ensure_table, open_db};
pub use writer::ChunkWriter;
