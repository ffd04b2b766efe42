/// Recommender
///
/// Request-scoped ranking pipeline over the shared, read-only feature store
/// and models:
///
/// 1. Select the (dong, quarter) candidate slice; empty -> "no data" result
/// 2. Select the quarter-wide comparison slice
/// 3. Growth + risk inference over the candidates, score per row
/// 4. Stable sort, truncate to `top_n`
/// 5. Reasons for each survivor against the quarter-wide medians
/// 6. Attach category / dong display names when lookups are loaded
use crate::models::{LocationMatch, RecommendRequest, RecommendationResult, ScoredItem};
use crate::services::feature_store::FeatureStore;
use crate::services::lookup::NameLookup;
use crate::services::ranking::{rank, ProbabilityModel, RankingScorer, Result};
use crate::services::reasons::QuarterBaseline;
use crate::services::search::search_locations;
use std::sync::Arc;
use tracing::{debug, info};

pub const EMPTY_SLICE_MESSAGE: &str = "해당 행정동/분기 데이터가 없습니다.";

pub struct Recommender {
    store: Arc<FeatureStore>,
    scorer: RankingScorer,
    category_names: Option<Arc<NameLookup>>,
    location_names: Option<Arc<NameLookup>>,
}

impl Recommender {
    pub fn new(
        store: Arc<FeatureStore>,
        growth: Arc<dyn ProbabilityModel>,
        risk: Arc<dyn ProbabilityModel>,
    ) -> Self {
        Self {
            store,
            scorer: RankingScorer::new(growth, risk),
            category_names: None,
            location_names: None,
        }
    }

    pub fn with_category_names(mut self, lookup: Option<NameLookup>) -> Self {
        self.category_names = lookup.map(Arc::new);
        self
    }

    pub fn with_location_names(mut self, lookup: Option<NameLookup>) -> Self {
        self.location_names = lookup.map(Arc::new);
        self
    }

    pub fn list_quarters(&self) -> Vec<String> {
        self.store.quarters()
    }

    pub fn list_location_codes(&self, quarter: &str) -> Vec<String> {
        self.store.location_codes(quarter)
    }

    pub fn search_locations(&self, query: &str, quarter: Option<&str>) -> Vec<LocationMatch> {
        search_locations(&self.store, self.location_names.as_deref(), query, quarter)
    }

    /// Rank the categories of one dong and quarter.
    ///
    /// `top_n` and `weight` are expected to be range-checked by the caller.
    /// Inference errors are returned as-is; nothing is retried.
    pub fn recommend(&self, request: &RecommendRequest) -> Result<RecommendationResult> {
        let candidates = self
            .store
            .location_slice(&request.location_code, &request.quarter);

        if candidates.is_empty() {
            info!(
                dong_code = %request.location_code,
                quarter = %request.quarter,
                "No feature rows for dong/quarter"
            );
            return Ok(RecommendationResult {
                location_code: request.location_code.clone(),
                location_name: None,
                quarter: request.quarter.clone(),
                weight: request.weight,
                items: vec![],
                message: Some(EMPTY_SLICE_MESSAGE.to_string()),
            });
        }

        let quarter_slice = self.store.quarter_slice(&request.quarter);

        let scored = self.scorer.score_candidates(&candidates, request.weight)?;
        let ranked = rank(scored, request.top_n);

        let baseline = QuarterBaseline::from_slice(&quarter_slice);
        let items: Vec<ScoredItem> = ranked
            .into_iter()
            .map(|scored| ScoredItem {
                category_code: scored.row.category_code.clone(),
                category_name: self.category_name(&scored.row.category_code),
                score: scored.score,
                probability_growth: scored.probability_growth,
                probability_risk: scored.probability_risk,
                reasons: baseline.reasons_for(scored.row),
            })
            .collect();

        debug!(
            dong_code = %request.location_code,
            quarter = %request.quarter,
            candidates = candidates.len(),
            quarter_rows = quarter_slice.len(),
            returned = items.len(),
            top_score = items.first().map(|item| item.score),
            "Recommendation ranked"
        );

        Ok(RecommendationResult {
            location_code: request.location_code.clone(),
            location_name: self
                .location_names
                .as_ref()
                .and_then(|lookup| lookup.name(&request.location_code))
                .map(str::to_string),
            quarter: request.quarter.clone(),
            weight: request.weight,
            items,
            message: None,
        })
    }

    fn category_name(&self, code: &str) -> Option<String> {
        self.category_names
            .as_ref()
            .and_then(|lookup| lookup.name(code))
            .map(str::to_string)
    }
}
