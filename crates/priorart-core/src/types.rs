//! Domain types shared by the lexical, dense and fusion stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ChunkId = String;
pub type DocId = String;

/// Section of the source document a chunk was cut from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Abstract,
    #[serde(alias = "body")]
    Description,
    #[serde(alias = "claims")]
    Claim,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Abstract => "abstract",
            Section::Description => "description",
            Section::Claim => "claim",
        }
    }

    /// Lenient parse used when reading rows back from storage.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abstract" => Some(Section::Abstract),
            "description" | "body" => Some(Section::Description),
            "claim" | "claims" => Some(Section::Claim),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed metadata carried by every chunk.
///
/// - `cpc`: classification codes of the owning document
/// - `year`: publication year, if known
/// - `mechanism_tags`: keyword tags extracted at ingestion time
/// - `figure`: path of the representative figure, if any
/// - `extra`: anything else the ingestion step chose to attach
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkMetadata {
    pub cpc: Vec<String>,
    pub year: Option<i32>,
    pub mechanism_tags: Vec<String>,
    pub figure: Option<String>,
    pub title: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// The atomic retrievable unit.
///
/// `id` is globally unique and stable for the lifetime of the index; a chunk
/// belongs to exactly one document (`doc_id`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: DocId,
    #[serde(default)]
    pub section: Section,
    /// Position within the section, e.g. the claim number.
    #[serde(default)]
    pub sub_index: Option<u32>,
    pub text: String,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

/// A (chunk, raw score) pair produced by a single scorer. Scores from
/// different scorers are not comparable until normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: ChunkId,
    pub score: f32,
}

/// A chunk with its normalized, combined fusion score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub id: ChunkId,
    pub score: f32,
}

/// A nearest-neighbour hit returned by the vector index, ordered by
/// ascending `distance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: ChunkId,
    pub distance: f32,
}

/// One entry of the final shortlist handed to the generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: ChunkId,
    pub doc_id: DocId,
    pub section: Section,
    pub sub_index: Option<u32>,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub combined_score: f32,
    /// Cross-encoder relevance, present only when reranking ran.
    pub rerank_score: Option<f32>,
}

impl RetrievedChunk {
    pub fn from_chunk(chunk: Chunk, combined_score: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            doc_id: chunk.doc_id,
            section: chunk.section,
            sub_index: chunk.sub_index,
            text: chunk.text,
            metadata: chunk.metadata,
            combined_score,
            rerank_score: None,
        }
    }
}
