// Utility functions for dong-recommender

/// Cell tokens read as a missing value in panel files.
const MISSING_TOKENS: [&str; 6] = ["", "na", "nan", "null", "none", "n/a"];

/// Coerce a location/quarter/category key to its canonical string form.
///
/// Keys stay strings: no case folding and no numeric parsing, so leading
/// zeros survive.
pub fn normalize_key(key: &str) -> &str {
    key.trim()
}

pub fn is_missing_token(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

/// Median of the finite values; `None` when there are none.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(vec![10.0, 20.0, 30.0]), Some(20.0));
        assert_eq!(median(vec![30.0, 10.0, 40.0, 20.0]), Some(25.0));
        assert_eq!(median(vec![7.0]), Some(7.0));
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn test_median_skips_nan() {
        assert_eq!(median(vec![f64::NAN, 1.0, 3.0, f64::NAN]), Some(2.0));
        assert_eq!(median(vec![f64::NAN]), None);
    }

    #[test]
    fn test_normalize_key_keeps_leading_zeros() {
        assert_eq!(normalize_key(" 01010 "), "01010");
        assert_eq!(normalize_key("2024Q3"), "2024Q3");
    }

    #[test]
    fn test_missing_tokens() {
        assert!(is_missing_token(""));
        assert!(is_missing_token(" NaN "));
        assert!(is_missing_token("NA"));
        assert!(is_missing_token("null"));
        assert!(!is_missing_token("0"));
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }
}
