use std::fs;
use tempfile::TempDir;

use priorart_core::corpus::MemoryCorpus;
use priorart_core::traits::CorpusReader;
use priorart_core::types::Section;

const US1: &str = r#"{"chunk_id":"US1_abstract_0","patent_number":"US1","section":"abstract","claim_no":null,"text":"Robotic bricklaying arm","metadata":{"cpc":["B25J","E04G"],"year":2019,"mechanism_tags":["gripper"],"figure_path":"figs/US1.png","title":"Brick robot"}}
{"chunk_id":"US1_claim_1","patent_number":"US1","section":"claims","claim_no":1,"text":"A system comprising a gripper","metadata":{"cpc":["B25J","E04G"],"year":2019,"mechanism_tags":[],"figure_path":"","title":"Brick robot"}}
"#;

const US2: &str = r#"{"chunk_id":"US2_description_0","patent_number":"US2","section":"description","text":"Concrete printing gantry","metadata":{"cpc":["B28B"],"year":2021}}
"#;

#[tokio::test]
async fn loads_jsonl_chunks_in_path_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("US2_chunks.jsonl"), US2).unwrap();
    fs::write(dir.join("US1_chunks.jsonl"), US1).unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let corpus = MemoryCorpus::from_jsonl_dir(dir).expect("load");
    let all = corpus.get_all().await.unwrap();

    let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["US1_abstract_0", "US1_claim_1", "US2_description_0"]);
    assert_eq!(all[1].section, Section::Claim);
    assert_eq!(all[1].sub_index, Some(1));
    assert_eq!(all[0].metadata.figure.as_deref(), Some("figs/US1.png"));
    assert_eq!(all[1].metadata.figure, None, "empty figure path means no figure");
    assert_eq!(all[2].metadata.year, Some(2021));
}

#[tokio::test]
async fn get_by_ids_matches_request_order_and_skips_unknown() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.jsonl"), US1).unwrap();
    let corpus = MemoryCorpus::from_jsonl_dir(tmp.path()).unwrap();

    let ids = vec!["US1_claim_1".to_string(), "missing".to_string(), "US1_abstract_0".to_string()];
    let got = corpus.get_by_ids(&ids).await.unwrap();
    let got: Vec<&str> = got.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(got, ["US1_claim_1", "US1_abstract_0"]);
}

#[tokio::test]
async fn empty_directory_is_an_empty_corpus() {
    let tmp = TempDir::new().unwrap();
    let corpus = MemoryCorpus::from_jsonl_dir(tmp.path()).unwrap();
    assert!(corpus.is_empty());
    assert!(corpus.get_all().await.unwrap().is_empty());
}

#[test]
fn malformed_line_reports_file_and_line() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.jsonl"), "{\"chunk_id\": 3}\n").unwrap();
    let err = MemoryCorpus::from_jsonl_dir(tmp.path()).unwrap_err();
    assert!(format!("{err:#}").contains("bad.jsonl:1"));
}
