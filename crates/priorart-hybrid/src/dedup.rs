use std::collections::HashSet;

/// Walk `items` in rank order keeping only the first item of each document,
/// stopping once `limit` items are kept. Relative order is preserved, and the
/// input is consumed lazily.
pub fn dedup_by_document<I, T, F>(items: I, doc_of: F, limit: usize) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    if limit == 0 { return out; }
    for item in items {
        if seen.insert(doc_of(&item).to_string()) {
            out.push(item);
            if out.len() == limit { break; }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keeps_first_chunk_per_document_in_rank_order() {
        let ranked = vec![("A1", "X", 0.9), ("A2", "Y", 0.8), ("A3", "X", 0.7)];
        let out = dedup_by_document(ranked, |r| r.1, 10);
        assert_eq!(out.iter().map(|r| r.0).collect::<Vec<_>>(), ["A1", "A2"]);
    }

    #[test]
    fn truncates_after_dedup() {
        let ranked = vec![("a", "1"), ("b", "1"), ("c", "2"), ("d", "3")];
        let out = dedup_by_document(ranked, |r| r.1, 2);
        assert_eq!(out, [("a", "1"), ("c", "2")]);
    }

    proptest! {
        #[test]
        fn output_is_unique_ordered_subsequence(docs in prop::collection::vec(0u8..5, 0..30), limit in 0usize..8) {
            let items: Vec<(usize, String)> = docs.iter().enumerate().map(|(i, d)| (i, d.to_string())).collect();
            let out = dedup_by_document(items.clone(), |r| r.1.as_str(), limit);
            prop_assert!(out.len() <= limit);
            let mut seen = HashSet::new();
            for r in &out { prop_assert!(seen.insert(r.1.clone())); }
            for w in out.windows(2) { prop_assert!(w[0].0 < w[1].0); }
        }
    }
}
