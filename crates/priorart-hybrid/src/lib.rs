//! priorart-hybrid
//!
//! Hybrid prior-art retrieval: multi-query expansion, lexical and dense
//! scoring, min-max fusion, per-document dedup and cross-encoder reranking.
pub mod dedup;
pub mod dense;
pub mod expansion;
pub mod fusion;
pub mod pipeline;
pub mod rerank;
pub mod service;
mod timeout;

pub use dedup::dedup_by_document;
pub use dense::{mean_vector, DenseScorer, DenseScores};
pub use expansion::QueryExpander;
pub use fusion::{fuse, normalize_distances, normalize_min_max, FusionWeights};
pub use pipeline::{RetrievalPipeline, RetrievalPipelineBuilder};
pub use rerank::Reranker;
pub use service::open_pipeline;
