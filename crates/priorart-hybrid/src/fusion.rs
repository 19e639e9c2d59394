//! Score normalisation and weighted linear fusion of the lexical and dense
//! signals.
//!
//! Lexical scores are min-max scaled to [0,1]; dense distances are scaled the
//! same way and flipped into similarities. When every value in a set is equal
//! the range guard maps each entry to 1. The fused score of a chunk is
//! `lexical_weight * lex + dense_weight * sim`, a missing signal counting 0.
//! When one signal has no entries at all, the other is used on its own.

use std::cmp::Ordering;
use std::collections::HashMap;

use priorart_core::config::RetrievalConfig;
use priorart_core::types::{ChunkId, FusedResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub lexical: f32,
    pub dense: f32,
}

impl Default for FusionWeights {
    fn default() -> Self { Self { lexical: 0.4, dense: 0.6 } }
}

impl From<&RetrievalConfig> for FusionWeights {
    fn from(c: &RetrievalConfig) -> Self { Self { lexical: c.lexical_weight, dense: c.dense_weight } }
}

fn min_max(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Min-max scale into [0,1]; all-equal input maps every entry to 1.
pub fn normalize_min_max(scores: &HashMap<ChunkId, f32>) -> HashMap<ChunkId, f32> {
    let Some((lo, hi)) = min_max(scores.values().copied()) else { return HashMap::new() };
    let range = hi - lo;
    scores
        .iter()
        .map(|(id, &v)| {
            let n = if range > 0.0 { (v - lo) / range } else { 1.0 };
            (id.clone(), n)
        })
        .collect()
}

/// Distances to similarities: `1 - (d - min) / (max - min)`, all-equal input
/// maps every entry to 1.
pub fn normalize_distances(distances: &HashMap<ChunkId, f32>) -> HashMap<ChunkId, f32> {
    let Some((lo, hi)) = min_max(distances.values().copied()) else { return HashMap::new() };
    let range = hi - lo;
    distances
        .iter()
        .map(|(id, &d)| {
            let s = if range > 0.0 { 1.0 - (d - lo) / range } else { 1.0 };
            (id.clone(), s)
        })
        .collect()
}

/// Fuse both signals into one ranking over the union of their chunk sets.
///
/// `position` gives a chunk's corpus insertion position and orders ties;
/// chunks without a position follow those with one, ordered by id.
pub fn fuse<P>(
    lexical: Option<&HashMap<ChunkId, f32>>,
    dense: Option<&HashMap<ChunkId, f32>>,
    weights: FusionWeights,
    position: P,
) -> Vec<FusedResult>
where
    P: Fn(&str) -> Option<usize>,
{
    let lex = lexical.map(normalize_min_max).unwrap_or_default();
    let sim = dense.map(normalize_distances).unwrap_or_default();

    let combined: HashMap<&ChunkId, f32> = match (lex.is_empty(), sim.is_empty()) {
        (true, true) => HashMap::new(),
        (false, true) => lex.iter().map(|(id, &s)| (id, s)).collect(),
        (true, false) => sim.iter().map(|(id, &s)| (id, s)).collect(),
        (false, false) => {
            let mut out: HashMap<&ChunkId, f32> = HashMap::with_capacity(lex.len().max(sim.len()));
            for (id, &s) in &lex { *out.entry(id).or_insert(0.0) += weights.lexical * s; }
            for (id, &s) in &sim { *out.entry(id).or_insert(0.0) += weights.dense * s; }
            out
        }
    };

    let mut ranked: Vec<(Option<usize>, FusedResult)> = combined
        .into_iter()
        .map(|(id, score)| (position(id), FusedResult { id: id.clone(), score }))
        .collect();
    ranked.sort_by(|(pa, a), (pb, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| cmp_position(*pa, *pb))
            .then_with(|| a.id.cmp(&b.id))
    });
    ranked.into_iter().map(|(_, r)| r).collect()
}

fn cmp_position(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
