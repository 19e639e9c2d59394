use priorart_core::filter::SearchFilter;

fn escape(s: &str) -> String { s.replace('\'', "''") }

/// Canonical codes joined as stored in the `cpc` column.
pub fn encode_cpc(codes: &[String]) -> String {
    let codes: Vec<String> = codes.iter().map(|c| priorart_core::filter::normalize_cpc(c)).filter(|c| !c.is_empty()).collect();
    if codes.is_empty() { String::new() } else { format!(",{},", codes.join(",")) }
}

/// SQL predicate equivalent to `SearchFilter::matches`; `None` for an empty filter.
/// Rows with a null year fail any year bound.
pub fn to_predicate(filter: &SearchFilter) -> Option<String> {
    let mut clauses = Vec::new();
    if let Some(codes) = filter.cpc_codes() {
        let ors: Vec<String> = codes.iter().map(|c| format!("cpc LIKE '%,{},%'", escape(c))).collect();
        clauses.push(format!("({})", ors.join(" OR ")));
    }
    if let Some(min) = filter.year_min { clauses.push(format!("year >= {min}")); }
    if let Some(max) = filter.year_max { clauses.push(format!("year <= {max}")); }
    if clauses.is_empty() { None } else { Some(clauses.join(" AND ")) }
}

pub(crate) fn id_list_predicate(ids: &[String]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("'{}'", escape(id))).collect();
    format!("id IN ({})", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_predicate() {
        assert_eq!(to_predicate(&SearchFilter::default()), None);
        assert_eq!(to_predicate(&SearchFilter::default().with_cpc(Vec::<String>::new())), None);
    }

    #[test]
    fn cpc_codes_are_ored_and_years_anded() {
        let f = SearchFilter::default().with_cpc(["b25j", "E04G"]).with_years(Some(2015), Some(2020));
        assert_eq!(
            to_predicate(&f).as_deref(),
            Some("(cpc LIKE '%,B25J,%' OR cpc LIKE '%,E04G,%') AND year >= 2015 AND year <= 2020")
        );
    }

    #[test]
    fn encodes_codes_with_delimiters() {
        assert_eq!(encode_cpc(&["b25j".into(), " E04G  21/22 ".into()]), ",B25J,E04G 21/22,");
        assert_eq!(encode_cpc(&[]), "");
    }

    #[test]
    fn quotes_in_ids_are_escaped() {
        assert_eq!(id_list_predicate(&["a'b".into(), "c".into()]), "id IN ('a''b', 'c')");
    }
}
