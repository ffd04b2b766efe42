use super::FeatureStore;
use crate::error::{AppError, Result};
use crate::models::{FeatureRow, CATEGORY_COLUMN, LOCATION_COLUMN, QUARTER_COLUMN};
use crate::utils::{is_missing_token, normalize_key};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load the feature panel from a CSV file.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<FeatureStore> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        AppError::DataLoad(format!("Cannot open feature panel {}: {}", path.display(), e))
    })?;

    let store = load_from_reader(file)?;
    info!(
        path = %path.display(),
        rows = store.len(),
        feature_columns = store.feature_columns().len(),
        "Feature panel loaded"
    );
    Ok(store)
}

/// Parse a CSV feature panel.
///
/// Identity columns stay strings; every other column is numeric, with
/// empty/NA-like cells read as missing values.
pub fn load_from_reader<R: Read>(reader: R) -> Result<FeatureStore> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column_index = |name: &str| {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            AppError::DataLoad(format!("Feature panel is missing the '{}' column", name))
        })
    };
    let location_idx = column_index(LOCATION_COLUMN)?;
    let quarter_idx = column_index(QUARTER_COLUMN)?;
    let category_idx = column_index(CATEGORY_COLUMN)?;

    let feature_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| ![location_idx, quarter_idx, category_idx].contains(idx))
        .map(|(idx, name)| (idx, name.to_string()))
        .collect();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cell = |idx: usize| record.get(idx).unwrap_or_default();

        let mut features = BTreeMap::new();
        for (idx, name) in &feature_columns {
            let value = parse_feature(cell(*idx)).ok_or_else(|| {
                AppError::DataLoad(format!(
                    "Line {}: column '{}' holds non-numeric value '{}'",
                    line,
                    name,
                    cell(*idx)
                ))
            })?;
            features.insert(name.clone(), value);
        }

        rows.push(FeatureRow {
            location_code: normalize_key(cell(location_idx)).to_string(),
            quarter: normalize_key(cell(quarter_idx)).to_string(),
            category_code: normalize_key(cell(category_idx)).to_string(),
            features,
        });
    }

    debug!(rows = rows.len(), "Parsed feature panel records");

    Ok(FeatureStore::new(
        rows,
        feature_columns.into_iter().map(|(_, name)| name).collect(),
    ))
}

/// `Some(None)` for a missing cell, `None` for an unparseable one.
fn parse_feature(cell: &str) -> Option<Option<f64>> {
    if is_missing_token(cell) {
        return Some(None);
    }
    cell.trim()
        .parse::<f64>()
        .ok()
        .map(|v| if v.is_nan() { None } else { Some(v) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PANEL: &str = "\
dong_code,quarter,biz_code,pop_mean,store_cnt,close_rate
01010,2024Q3,CS100001,120.5,3,0.1
01010,2024Q3,CS100002,,7,NA
11010,2024Q3, CS100001 ,80,2,0.05
";

    #[test]
    fn test_load_from_reader() {
        let store = load_from_reader(PANEL.as_bytes()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(
            store.feature_columns(),
            &["pop_mean".to_string(), "store_cnt".to_string(), "close_rate".to_string()]
        );

        let slice = store.location_slice("01010", "2024Q3");
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[0].value("pop_mean"), Some(120.5));
        assert!(slice[1].has_feature("pop_mean"));
        assert_eq!(slice[1].value("pop_mean"), None);
        assert_eq!(slice[1].value("close_rate"), None);

        let trimmed = store.location_slice("11010", "2024Q3");
        assert_eq!(trimmed[0].category_code, "CS100001");
    }

    #[test]
    fn test_missing_identity_column() {
        let err = load_from_reader("dong_code,quarter,pop_mean\n1,2024Q3,1\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, AppError::DataLoad(msg) if msg.contains("biz_code")));
    }

    #[test]
    fn test_non_numeric_feature_is_rejected() {
        let panel = "dong_code,quarter,biz_code,pop_mean\n1,2024Q3,CS1,lots\n";
        let err = load_from_reader(panel.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::DataLoad(msg) if msg.contains("pop_mean")));
    }

    #[test]
    fn test_load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PANEL.as_bytes()).unwrap();

        let store = load_csv(file.path()).unwrap();
        assert_eq!(store.quarters(), vec!["2024Q3"]);
        assert_eq!(store.location_codes("2024Q3"), vec!["01010", "11010"]);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/nonexistent/features_panel.csv").unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }
}
