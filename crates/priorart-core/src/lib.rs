//! priorart-core
//!
//! Typed records, capability traits, filters, errors and configuration shared
//! by the lexical, dense and hybrid retrieval crates.

pub mod config;
pub mod corpus;
pub mod error;
pub mod filter;
pub mod logging;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use filter::SearchFilter;
pub use types::{Chunk, ChunkMetadata, FusedResult, RetrievedChunk, ScoredCandidate, Section, VectorHit};
