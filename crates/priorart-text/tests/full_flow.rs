use std::sync::Arc;

use priorart_core::corpus::MemoryCorpus;
use priorart_core::filter::SearchFilter;
use priorart_core::types::{Chunk, ChunkMetadata, Section};
use priorart_text::{LexicalScorer, LexicalScores};

fn chunk(id: &str, doc: &str, text: &str, cpc: &[&str], year: Option<i32>) -> Chunk {
    Chunk {
        id: id.into(),
        doc_id: doc.into(),
        section: Section::Abstract,
        sub_index: None,
        text: text.into(),
        metadata: ChunkMetadata { cpc: cpc.iter().map(|s| s.to_string()).collect(), year, ..Default::default() },
    }
}

fn corpus() -> Vec<Chunk> {
    vec![
        chunk("c1", "US1", "robotic arm lays bricks on a wall", &["B25J"], Some(2019)),
        chunk("c2", "US2", "concrete pump for foundations", &["E02D"], Some(2015)),
        chunk("c3", "US3", "brick gripper for a robotic mason", &["B25J", "E04G"], Some(2021)),
    ]
}

fn q(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

#[test]
fn every_filter_passing_chunk_gets_a_score() {
    let scorer = LexicalScorer::from_chunks(corpus()).expect("build");
    let LexicalScores::Scored(scores) = scorer.score(&q(&["robotic"]), &SearchFilter::default()) else { panic!("expected scores") };
    assert_eq!(scores.len(), 3);
    assert!(scores["c1"] > 0.0);
    assert!(scores["c3"] > 0.0);
    assert_eq!(scores["c2"], 0.0);
}

#[test]
fn scores_are_summed_across_queries() {
    let scorer = LexicalScorer::from_chunks(corpus()).expect("build");
    let f = SearchFilter::default();
    let one = scorer.score(&q(&["concrete"]), &f);
    let two = scorer.score(&q(&["concrete", "concrete"]), &f);
    let (one, two) = (one.scores().unwrap()["c2"], two.scores().unwrap()["c2"]);
    assert!(one > 0.0);
    assert!((two - 2.0 * one).abs() < 1e-4);
}

#[test]
fn filter_excludes_chunks_from_the_map() {
    let scorer = LexicalScorer::from_chunks(corpus()).expect("build");
    let filter = SearchFilter::default().with_cpc(vec![String::from("B25J")]).with_years(Some(2020), None);
    let scores = scorer.score(&q(&["robotic brick"]), &filter);
    let keys: Vec<&String> = scores.scores().unwrap().keys().collect();
    assert_eq!(keys, ["c3"]);
}

#[test]
fn empty_corpus_is_unavailable() {
    let scorer = LexicalScorer::from_chunks(Vec::new()).expect("build");
    assert!(matches!(scorer.score(&q(&["robot"]), &SearchFilter::default()), LexicalScores::Unavailable(_)));
    assert!(!LexicalScorer::empty().score(&q(&["robot"]), &SearchFilter::default()).is_available());
}

#[tokio::test]
async fn rebuild_swaps_model_while_old_snapshot_keeps_serving() {
    let scorer = Arc::new(LexicalScorer::from_corpus(&MemoryCorpus::new(corpus())).await.expect("build"));
    let before = scorer.snapshot().expect("model");

    let mut next = corpus();
    next.push(chunk("c4", "US4", "telescopic crane boom", &["B66C"], Some(2022)));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let s = scorer.clone();
            std::thread::spawn(move || s.score(&q(&["crane"]), &SearchFilter::default()).is_available())
        })
        .collect();
    let n = scorer.rebuild(&MemoryCorpus::new(next)).await.expect("rebuild");
    for r in readers { assert!(r.join().unwrap()); }

    assert_eq!(n, 4);
    assert_eq!(before.len(), 3);
    let scores = scorer.score(&q(&["crane"]), &SearchFilter::default());
    assert!(scores.scores().unwrap()["c4"] > 0.0);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        #[test]
        fn scores_are_non_negative_and_cover_the_filtered_corpus(
            words in prop::collection::vec("[a-z]{1,8}", 0..6),
            year_min in prop::option::of(2010i32..2025),
        ) {
            let scorer = LexicalScorer::from_chunks(corpus()).unwrap();
            let filter = SearchFilter::default().with_years(year_min, None);
            let scores = scorer.score(&[words.join(" ")], &filter);
            let map = scores.scores().unwrap();
            let expected = corpus().iter().filter(|c| filter.matches(&c.metadata)).count();
            prop_assert_eq!(map.len(), expected);
            prop_assert!(map.values().all(|s| *s >= 0.0 && s.is_finite()));
        }
    }
}
