#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use priorart_core::filter::SearchFilter;
use priorart_core::traits::{CorpusReader, CrossEncoder, Embedder, TextGenerator, VectorIndex};
use priorart_core::types::{Chunk, ChunkMetadata, Section, VectorHit};

pub fn chunk(id: &str, doc: &str, text: &str, cpc: &[&str], year: Option<i32>) -> Chunk {
    Chunk {
        id: id.into(),
        doc_id: doc.into(),
        section: Section::Abstract,
        sub_index: None,
        text: text.into(),
        metadata: ChunkMetadata { cpc: cpc.iter().map(|s| s.to_string()).collect(), year, ..Default::default() },
    }
}

pub fn ids(results: &[priorart_core::RetrievedChunk]) -> Vec<&str> {
    results.iter().map(|r| r.chunk_id.as_str()).collect()
}

/// Returns fixed distances for known chunks, honouring the filter.
pub struct FakeVectorIndex {
    pub chunks: Vec<Chunk>,
    pub distances: HashMap<String, f32>,
    pub calls: AtomicUsize,
}

impl FakeVectorIndex {
    pub fn new(chunks: Vec<Chunk>, distances: &[(&str, f32)]) -> Self {
        Self { chunks, distances: distances.iter().map(|(k, v)| (k.to_string(), *v)).collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl VectorIndex for FakeVectorIndex {
    async fn search(&self, _query_vec: &[f32], k: usize, filter: &SearchFilter) -> anyhow::Result<Vec<VectorHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut hits: Vec<VectorHit> = self
            .chunks
            .iter()
            .filter(|c| filter.matches(&c.metadata))
            .filter_map(|c| self.distances.get(&c.id).map(|d| VectorHit { id: c.id.clone(), distance: *d }))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }
}

pub struct FailingVectorIndex;

#[async_trait]
impl VectorIndex for FailingVectorIndex {
    async fn search(&self, _: &[f32], _: usize, _: &SearchFilter) -> anyhow::Result<Vec<VectorHit>> {
        anyhow::bail!("index offline")
    }
}

/// Constant embedder that records every batch it receives.
#[derive(Default)]
pub struct RecordingEmbedder { pub seen: Mutex<Vec<Vec<String>>> }

#[async_trait]
impl Embedder for RecordingEmbedder {
    fn dim(&self) -> usize { 2 }
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.seen.lock().unwrap().push(texts.to_vec());
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { 2 }
    async fn embed_batch(&self, _: &[String]) -> anyhow::Result<Vec<Vec<f32>>> { anyhow::bail!("embedding service down") }
}

pub struct FixedGenerator(pub String);

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn complete(&self, _: &str) -> anyhow::Result<String> { Ok(self.0.clone()) }
}

pub struct SlowGenerator(pub Duration);

#[async_trait]
impl TextGenerator for SlowGenerator {
    async fn complete(&self, _: &str) -> anyhow::Result<String> {
        tokio::time::sleep(self.0).await;
        Ok("late variant".into())
    }
}

/// Scores each pair by a per-text lookup; unknown texts score 0.
pub struct TableCrossEncoder(pub HashMap<String, f32>);

#[async_trait]
impl CrossEncoder for TableCrossEncoder {
    async fn score(&self, pairs: &[(String, String)]) -> anyhow::Result<Vec<f32>> {
        Ok(pairs.iter().map(|(_, t)| self.0.get(t).copied().unwrap_or(0.0)).collect())
    }
}

pub struct FailingCrossEncoder;

#[async_trait]
impl CrossEncoder for FailingCrossEncoder {
    async fn score(&self, _: &[(String, String)]) -> anyhow::Result<Vec<f32>> { anyhow::bail!("model crashed") }
}

/// Corpus reader that only answers lookups; used to check records resolve for
/// chunks the lexical model does not know.
pub struct MapCorpus(pub Vec<Chunk>);

#[async_trait]
impl CorpusReader for MapCorpus {
    async fn get_all(&self) -> anyhow::Result<Vec<Chunk>> { Ok(self.0.clone()) }
    async fn get_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Chunk>> {
        Ok(ids.iter().filter_map(|id| self.0.iter().find(|c| &c.id == id).cloned()).collect())
    }
}
