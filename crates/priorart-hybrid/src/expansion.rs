//! Multi-query expansion through an optional text generator.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use priorart_core::traits::TextGenerator;

use crate::timeout::bounded;

pub struct QueryExpander {
    generator: Option<Arc<dyn TextGenerator>>,
    count: usize,
    timeout: Duration,
}

impl QueryExpander {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, count: usize, timeout: Duration) -> Self {
        Self { generator, count, timeout }
    }

    /// Expander that always returns just the original query.
    pub fn disabled() -> Self { Self::new(None, 0, Duration::ZERO) }

    pub fn is_enabled(&self) -> bool { self.generator.is_some() && self.count > 0 }

    /// The original query first, followed by up to `count` distinct variants.
    /// Any generator failure or timeout degrades to `[query]`.
    pub async fn expand(&self, query: &str) -> Vec<String> {
        let Some(generator) = self.generator.as_ref().filter(|_| self.count > 0) else {
            return vec![query.to_string()];
        };
        let prompt = build_prompt(query, self.count);
        match bounded("expansion", self.timeout, generator.complete(&prompt)).await {
            Ok(text) => {
                let queries = parse_variants(query, &text, self.count);
                tracing::debug!(variants = queries.len() - 1, "query expanded");
                queries
            }
            Err(e) => {
                tracing::warn!(error = %e, "query expansion failed, using original query");
                vec![query.to_string()]
            }
        }
    }
}

pub fn build_prompt(query: &str, count: usize) -> String {
    format!(
        "You write search queries for a patent prior-art search engine.\n\
         Write {count} different search queries for the design request below. \
         Each query should target a different aspect of the design \
         (mechanism, structure, function, application).\n\
         Answer with one query per line and nothing else.\n\n\
         Design request: {query}"
    )
}

/// Split a generator response into query variants: one per line, list markers
/// and surrounding quotes stripped, blanks and case-insensitive duplicates
/// (including of `original`) dropped, at most `count` kept.
pub fn parse_variants(original: &str, response: &str, count: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(original.trim().to_lowercase());
    let mut out = vec![original.to_string()];
    for line in response.lines() {
        if out.len() > count { break; }
        let variant = clean_line(line);
        if variant.is_empty() { continue; }
        if seen.insert(variant.to_lowercase()) { out.push(variant.to_string()); }
    }
    out
}

fn clean_line(line: &str) -> &str {
    let mut s = line.trim();
    s = s.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &s[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            s = stripped.trim_start();
        }
    }
    s.trim_matches(|c| c == '"' || c == '\'' || c == '“' || c == '”').trim()
}
