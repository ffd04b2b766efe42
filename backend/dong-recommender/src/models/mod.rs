use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity columns of the feature panel. Everything else is a numeric feature.
pub const LOCATION_COLUMN: &str = "dong_code";
pub const QUARTER_COLUMN: &str = "quarter";
pub const CATEGORY_COLUMN: &str = "biz_code";

/// One (location, quarter, category) observation of the feature panel.
///
/// `features` maps a column name to its value; `None` marks a missing cell.
/// A column absent from the map means the row never carried that feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub location_code: String,
    pub quarter: String,
    pub category_code: String,
    pub features: BTreeMap<String, Option<f64>>,
}

impl FeatureRow {
    pub fn new(
        location_code: impl Into<String>,
        quarter: impl Into<String>,
        category_code: impl Into<String>,
    ) -> Self {
        Self {
            location_code: location_code.into(),
            quarter: quarter.into(),
            category_code: category_code.into(),
            features: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    /// Defined value of a feature. Missing cells and NaN both read as `None`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.features
            .get(name)
            .copied()
            .flatten()
            .filter(|v| !v.is_nan())
    }
}

/// Validated input of a ranking request.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    pub location_code: String,
    pub quarter: String,
    pub top_n: usize,
    pub weight: f64,
}

/// A ranked category with its model outputs and justifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    #[serde(rename = "biz_code")]
    pub category_code: String,
    #[serde(rename = "biz_name")]
    pub category_name: Option<String>,
    pub score: f64,
    #[serde(rename = "proba_growth")]
    pub probability_growth: f64,
    #[serde(rename = "proba_risk")]
    pub probability_risk: f64,
    pub reasons: Vec<String>,
}

/// Response envelope of `recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    #[serde(rename = "dong_code")]
    pub location_code: String,
    #[serde(rename = "dong_name")]
    pub location_name: Option<String>,
    pub quarter: String,
    #[serde(rename = "alpha")]
    pub weight: f64,
    pub items: Vec<ScoredItem>,
    /// Only set when the (location, quarter) slice is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Search hit for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMatch {
    #[serde(rename = "dong_code")]
    pub location_code: String,
    #[serde(rename = "dong_name")]
    pub location_name: Option<String>,
}
