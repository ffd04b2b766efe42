use crate::models::LocationMatch;
use crate::services::feature_store::FeatureStore;
use crate::services::lookup::NameLookup;
use std::collections::HashSet;

pub const SEARCH_RESULT_LIMIT: usize = 30;

/// Find locations by code substring, or by name when a lookup is loaded.
///
/// Hits are ordered code matches first, then name matches, then exact-code
/// lookup matches; each code appears once (first hit wins) and the list is
/// capped at `SEARCH_RESULT_LIMIT`.
pub fn search_locations(
    store: &FeatureStore,
    names: Option<&NameLookup>,
    query: &str,
    quarter: Option<&str>,
) -> Vec<LocationMatch> {
    let query = query.trim();
    if query.is_empty() {
        return vec![];
    }

    let quarter = quarter.map(str::trim).filter(|q| !q.is_empty());
    let codes = store.distinct_location_codes(quarter);
    let name_of = |code: &str| names.and_then(|lookup| lookup.name(code)).map(str::to_string);

    let mut hits: Vec<LocationMatch> = codes
        .iter()
        .filter(|code| code.contains(query))
        .map(|&code| LocationMatch {
            location_code: code.to_string(),
            location_name: name_of(code),
        })
        .collect();

    if let Some(lookup) = names {
        let valid: HashSet<&str> = codes.iter().copied().collect();
        let needle = query.to_lowercase();

        let name_hits = lookup
            .entries()
            .filter(|(code, name)| valid.contains(code) && name.to_lowercase().contains(&needle));
        let exact_hits = lookup
            .entries()
            .filter(|(code, _)| valid.contains(code) && *code == query);

        hits.extend(name_hits.chain(exact_hits).map(|(code, name)| LocationMatch {
            location_code: code.to_string(),
            location_name: Some(name.to_string()),
        }));
    }

    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(hit.location_code.clone()))
        .take(SEARCH_RESULT_LIMIT)
        .collect()
}
