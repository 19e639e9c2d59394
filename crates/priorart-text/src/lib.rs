pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::LexicalIndex;
pub use search::{LexicalScorer, LexicalScores};
