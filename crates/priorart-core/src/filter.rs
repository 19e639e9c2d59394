//! Structured retrieval filters: classification-code membership and an
//! inclusive publication-year range. Both are optional and combine with AND.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::types::ChunkMetadata;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    pub cpc: Option<Vec<String>>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
}

fn cpc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Subclass (B25J), optionally a main group (B25J9) and subgroup (B25J 9/16).
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-HY][0-9]{2}[A-Z](\s*[0-9]{1,4}(/[0-9]{1,6})?)?$").expect("static regex")
    })
}

/// Canonical form used for comparisons: trimmed, upper-cased, inner
/// whitespace collapsed to a single space.
pub fn normalize_cpc(code: &str) -> String {
    code.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

pub fn is_valid_cpc(code: &str) -> bool {
    cpc_pattern().is_match(&normalize_cpc(code))
}

impl SearchFilter {
    pub fn with_cpc<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cpc = Some(codes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_years(mut self, year_min: Option<i32>, year_max: Option<i32>) -> Self {
        self.year_min = year_min;
        self.year_max = year_max;
        self
    }

    /// Permitted codes in canonical form; `None` when no cpc constraint applies.
    pub fn cpc_codes(&self) -> Option<Vec<String>> {
        match &self.cpc {
            Some(codes) if !codes.is_empty() => Some(codes.iter().map(|c| normalize_cpc(c)).collect()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cpc_codes().is_none() && self.year_min.is_none() && self.year_max.is_none()
    }

    /// Reject malformed filters before any retrieval work happens.
    pub fn validate(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.year_min, self.year_max) {
            if min > max {
                return Err(Error::InvalidFilter(format!(
                    "year_min ({min}) is greater than year_max ({max})"
                )));
            }
        }
        if let Some(codes) = &self.cpc {
            if let Some(bad) = codes.iter().find(|c| !is_valid_cpc(c)) {
                return Err(Error::InvalidFilter(format!(
                    "unrecognized classification code: '{bad}'"
                )));
            }
        }
        Ok(())
    }

    /// True when `meta` satisfies every supplied predicate.
    pub fn matches(&self, meta: &ChunkMetadata) -> bool {
        if let Some(codes) = self.cpc_codes() {
            let hit = meta
                .cpc
                .iter()
                .map(|c| normalize_cpc(c))
                .any(|c| codes.contains(&c));
            if !hit {
                return false;
            }
        }
        if self.year_min.is_some() || self.year_max.is_some() {
            let Some(year) = meta.year else { return false };
            if self.year_min.is_some_and(|min| year < min) {
                return false;
            }
            if self.year_max.is_some_and(|max| year > max) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(cpc: &[&str], year: Option<i32>) -> ChunkMetadata {
        ChunkMetadata {
            cpc: cpc.iter().map(|s| s.to_string()).collect(),
            year,
            ..Default::default()
        }
    }

    #[test]
    fn validates_year_order() {
        let f = SearchFilter::default().with_years(Some(2022), Some(2018));
        assert!(matches!(f.validate(), Err(Error::InvalidFilter(_))));
        let f = SearchFilter::default().with_years(Some(2018), Some(2018));
        assert!(f.validate().is_ok());
    }

    #[test]
    fn validates_cpc_syntax() {
        assert!(is_valid_cpc("B25J"));
        assert!(is_valid_cpc("e04g"));
        assert!(is_valid_cpc("E04G 21/22"));
        assert!(is_valid_cpc("Y02E 10/50"));
        assert!(!is_valid_cpc("Z99Q"));
        assert!(!is_valid_cpc("B25"));
        assert!(!is_valid_cpc("robots"));
        let f = SearchFilter::default().with_cpc(["B25J", "nonsense"]);
        assert!(matches!(f.validate(), Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn main_group_codes_validate_and_match() {
        assert!(is_valid_cpc("B25J 9"));
        assert!(!is_valid_cpc("B25J9/"));
        let f = SearchFilter::default().with_cpc(["b25j9"]);
        assert!(f.validate().is_ok());
        assert!(f.matches(&meta(&["B25J9", "E04G21"], Some(2019))));
        assert!(!f.matches(&meta(&["B25J"], Some(2019))));
    }

    #[test]
    fn empty_cpc_list_is_no_constraint() {
        let f = SearchFilter::default().with_cpc(Vec::<String>::new());
        assert!(f.is_empty());
        assert!(f.matches(&meta(&[], None)));
    }

    #[test]
    fn cpc_membership_is_any_of() {
        let f = SearchFilter::default().with_cpc(["E04G"]);
        assert!(f.matches(&meta(&["B25J", "e04g"], Some(2020))));
        assert!(!f.matches(&meta(&["B25J"], Some(2020))));
    }

    #[test]
    fn year_bounds_are_inclusive_and_require_a_year() {
        let f = SearchFilter::default().with_years(Some(2018), Some(2020));
        assert!(f.matches(&meta(&[], Some(2018))));
        assert!(f.matches(&meta(&[], Some(2020))));
        assert!(!f.matches(&meta(&[], Some(2021))));
        assert!(!f.matches(&meta(&[], None)));
    }

    #[test]
    fn predicates_combine_with_and() {
        let f = SearchFilter::default()
            .with_cpc(["B25J"])
            .with_years(Some(2019), None);
        assert!(f.matches(&meta(&["B25J"], Some(2019))));
        assert!(!f.matches(&meta(&["B25J"], Some(2017))));
        assert!(!f.matches(&meta(&["E02F"], Some(2020))));
    }

    #[test]
    fn deserializes_request_shape() {
        let f: SearchFilter =
            serde_json::from_str(r#"{"cpc":["B25J","E04G"],"year_min":2018}"#).unwrap();
        assert_eq!(f.cpc_codes(), Some(vec!["B25J".to_string(), "E04G".to_string()]));
        assert_eq!(f.year_min, Some(2018));
        assert_eq!(f.year_max, None);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn year_filter_agrees_with_bounds(
                year in prop::option::of(1990i32..2030),
                min in prop::option::of(1990i32..2030),
                max in prop::option::of(1990i32..2030),
            ) {
                let f = SearchFilter::default().with_years(min, max);
                let expected = match year {
                    None => min.is_none() && max.is_none(),
                    Some(y) => min.map_or(true, |m| y >= m) && max.map_or(true, |m| y <= m),
                };
                prop_assert_eq!(f.matches(&meta(&[], year)), expected);
            }

            #[test]
            fn normalization_is_idempotent(code in "[a-hA-H][0-9]{2}[a-zA-Z]( *[0-9]{1,4}(/[0-9]{1,6})?)?") {
                let once = normalize_cpc(&code);
                prop_assert_eq!(normalize_cpc(&once), once.clone());
                prop_assert!(is_valid_cpc(&code));
            }
        }
    }
}
