/// Feature Store Module
///
/// Read-only, in-memory feature panel keyed by (location, quarter, category).
/// Loaded once at startup and shared behind an `Arc`; requests only take
/// borrowed slices of it.
pub mod loader;

pub use loader::{load_csv, load_from_reader};

use crate::models::FeatureRow;
use crate::utils::normalize_key;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    rows: Vec<FeatureRow>,
    /// Feature columns in panel order (identity columns excluded)
    feature_columns: Vec<String>,
}

impl FeatureStore {
    pub fn new(rows: Vec<FeatureRow>, feature_columns: Vec<String>) -> Self {
        Self {
            rows,
            feature_columns,
        }
    }

    /// Build a store whose column list is the union of the rows' features,
    /// in first-seen order.
    pub fn from_rows(rows: Vec<FeatureRow>) -> Self {
        let mut seen = HashSet::new();
        let mut feature_columns = Vec::new();
        for row in &rows {
            for name in row.features.keys() {
                if seen.insert(name.as_str()) {
                    feature_columns.push(name.clone());
                }
            }
        }
        drop(seen);

        Self::new(rows, feature_columns)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    /// Candidate slice: every row of one (location, quarter) pair, in panel order.
    pub fn location_slice(&self, location_code: &str, quarter: &str) -> Vec<&FeatureRow> {
        let location_code = normalize_key(location_code);
        let quarter = normalize_key(quarter);
        self.rows
            .iter()
            .filter(|row| row.location_code == location_code && row.quarter == quarter)
            .collect()
    }

    /// Comparison slice: every row of a quarter, any location.
    pub fn quarter_slice(&self, quarter: &str) -> Vec<&FeatureRow> {
        let quarter = normalize_key(quarter);
        self.rows.iter().filter(|row| row.quarter == quarter).collect()
    }

    /// Distinct quarters, lexicographically sorted.
    pub fn quarters(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.quarter.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct location codes of a quarter, lexicographically sorted.
    pub fn location_codes(&self, quarter: &str) -> Vec<String> {
        self.quarter_slice(quarter)
            .into_iter()
            .map(|row| row.location_code.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Distinct location codes in first-appearance order, optionally
    /// restricted to one quarter.
    pub fn distinct_location_codes(&self, quarter: Option<&str>) -> Vec<&str> {
        let quarter = quarter.map(normalize_key);
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| quarter.map_or(true, |q| row.quarter == q))
            .map(|row| row.location_code.as_str())
            .filter(|code| seen.insert(*code))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(location: &str, quarter: &str, category: &str) -> FeatureRow {
        FeatureRow::new(location, quarter, category).with_feature("pop_mean", Some(1.0))
    }

    fn store() -> FeatureStore {
        FeatureStore::from_rows(vec![
            row("11020", "2024Q3", "CS100001"),
            row("11010", "2024Q3", "CS100001"),
            row("11010", "2024Q3", "CS100002"),
            row("11010", "2024Q2", "CS100001"),
            row("01010", "2024Q2", "CS100003"),
        ])
    }

    #[test]
    fn test_location_slice() {
        let store = store();
        let slice = store.location_slice("11010", "2024Q3");
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[0].category_code, "CS100001");
        assert_eq!(slice[1].category_code, "CS100002");

        assert!(store.location_slice("99999", "2024Q3").is_empty());
    }

    #[test]
    fn test_slice_keys_are_trimmed_strings() {
        let store = store();
        assert_eq!(store.location_slice(" 11010 ", "2024Q3 ").len(), 2);
        assert_eq!(store.location_slice("01010", "2024Q2").len(), 1);
        assert!(store.location_slice("1010", "2024Q2").is_empty());
    }

    #[test]
    fn test_quarter_slice_spans_locations() {
        let store = store();
        let slice = store.quarter_slice("2024Q3");
        assert_eq!(slice.len(), 3);
        assert!(slice.iter().any(|r| r.location_code == "11020"));
    }

    #[test]
    fn test_quarters_and_location_codes_sorted() {
        let store = store();
        assert_eq!(store.quarters(), vec!["2024Q2", "2024Q3"]);
        assert_eq!(store.location_codes("2024Q2"), vec!["01010", "11010"]);
        assert_eq!(store.location_codes("2023Q1"), Vec::<String>::new());
    }

    #[test]
    fn test_distinct_location_codes_first_appearance() {
        let store = store();
        assert_eq!(
            store.distinct_location_codes(None),
            vec!["11020", "11010", "01010"]
        );
        assert_eq!(
            store.distinct_location_codes(Some("2024Q2")),
            vec!["11010", "01010"]
        );
    }

    #[test]
    fn test_from_rows_collects_columns() {
        let store = FeatureStore::from_rows(vec![
            FeatureRow::new("1", "q", "a").with_feature("b", Some(1.0)),
            FeatureRow::new("1", "q", "b")
                .with_feature("a", None)
                .with_feature("b", Some(2.0)),
        ]);
        assert_eq!(store.feature_columns(), &["b".to_string(), "a".to_string()]);
    }
}
