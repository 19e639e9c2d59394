//! In-memory corpus reader.
//!
//! Holds chunks in insertion order. Can be loaded from the JSONL chunk files
//! written by the ingestion step (`<doc>_chunks.jsonl`, one chunk per line).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::traits::CorpusReader;
use crate::types::{Chunk, ChunkMetadata, Section};

#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    chunks: Vec<Chunk>,
    by_id: HashMap<String, usize>,
}

impl MemoryCorpus {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        let mut corpus = Self::default();
        for c in chunks { corpus.push(c); }
        corpus
    }

    /// Append a chunk. A repeated id replaces the earlier record in place so
    /// ids stay unique and keep their original position.
    pub fn push(&mut self, chunk: Chunk) {
        match self.by_id.get(&chunk.id) {
            Some(&pos) => self.chunks[pos] = chunk,
            None => {
                self.by_id.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk);
            }
        }
    }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }

    /// Load every `*.jsonl` file under `dir` (sorted by path, lines in order).
    pub fn from_jsonl_dir(dir: &Path) -> Result<Self> {
        let mut corpus = Self::default();
        for path in list_jsonl_files(dir) {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            for (lineno, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() { continue; }
                let record: ChunkRecord = serde_json::from_str(line)
                    .with_context(|| format!("{}:{}: malformed chunk record", path.display(), lineno + 1))?;
                corpus.push(record.into_chunk());
            }
        }
        tracing::debug!(chunks = corpus.len(), dir = %dir.display(), "loaded jsonl corpus");
        Ok(corpus)
    }
}

#[async_trait]
impl CorpusReader for MemoryCorpus {
    async fn get_all(&self) -> Result<Vec<Chunk>> {
        Ok(self.chunks.clone())
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Chunk>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.by_id.get(id).map(|&pos| self.chunks[pos].clone()))
            .collect())
    }
}

fn list_jsonl_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("jsonl"))
        .collect();
    files.sort();
    files
}

/// On-disk shape of one chunk line as written by the ingestion step.
#[derive(Debug, Deserialize)]
struct ChunkRecord {
    chunk_id: String,
    patent_number: String,
    #[serde(default)]
    section: Option<String>,
    #[serde(default)]
    claim_no: Option<u32>,
    text: String,
    #[serde(default)]
    metadata: RecordMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordMetadata {
    cpc: Vec<String>,
    year: Option<i32>,
    mechanism_tags: Vec<String>,
    figure_path: Option<String>,
    title: Option<String>,
}

impl ChunkRecord {
    fn into_chunk(self) -> Chunk {
        let m = self.metadata;
        Chunk {
            id: self.chunk_id,
            doc_id: self.patent_number,
            section: self.section.as_deref().and_then(Section::parse).unwrap_or_default(),
            sub_index: self.claim_no,
            text: self.text,
            metadata: ChunkMetadata {
                cpc: m.cpc,
                year: m.year,
                mechanism_tags: m.mechanism_tags,
                figure: m.figure_path.filter(|p| !p.is_empty()),
                title: m.title.filter(|t| !t.is_empty()),
                extra: Default::default(),
            },
        }
    }
}
