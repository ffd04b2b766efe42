/// Candidate Scoring Module
///
/// Runs both probability models over a candidate batch and combines their
/// outputs into one ranking score per row.
use super::{ProbabilityModel, RankingError, Result};
use crate::models::FeatureRow;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Ranking score: growth probability offset by weighted risk.
///
/// Not clamped or normalised; only meaningful relative to other scores.
pub fn combined_score(probability_growth: f64, probability_risk: f64, weight: f64) -> f64 {
    probability_growth - weight * probability_risk
}

/// A candidate row with both model outputs and its score.
#[derive(Debug, Clone)]
pub struct ScoredRow<'a> {
    pub row: &'a FeatureRow,
    pub probability_growth: f64,
    pub probability_risk: f64,
    pub score: f64,
}

pub struct RankingScorer {
    growth: Arc<dyn ProbabilityModel>,
    risk: Arc<dyn ProbabilityModel>,
}

impl RankingScorer {
    pub fn new(growth: Arc<dyn ProbabilityModel>, risk: Arc<dyn ProbabilityModel>) -> Self {
        Self { growth, risk }
    }

    /// Score a candidate batch, keeping input order.
    ///
    /// Each model is invoked once with the whole batch.
    pub fn score_candidates<'a>(
        &self,
        candidates: &[&'a FeatureRow],
        weight: f64,
    ) -> Result<Vec<ScoredRow<'a>>> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let growth = self.predict(self.growth.as_ref(), candidates)?;
        let risk = self.predict(self.risk.as_ref(), candidates)?;

        let scored: Vec<ScoredRow<'a>> = candidates
            .iter()
            .zip(growth)
            .zip(risk)
            .map(|((row, probability_growth), probability_risk)| ScoredRow {
                row: *row,
                probability_growth,
                probability_risk,
                score: combined_score(probability_growth, probability_risk, weight),
            })
            .collect();

        debug!(
            candidate_count = scored.len(),
            growth_model = self.growth.name(),
            risk_model = self.risk.name(),
            "Scoring complete"
        );

        Ok(scored)
    }

    fn predict(&self, model: &dyn ProbabilityModel, candidates: &[&FeatureRow]) -> Result<Vec<f64>> {
        let probabilities = model.predict_proba(candidates)?;
        if probabilities.len() != candidates.len() {
            return Err(RankingError::InferenceError(format!(
                "Model '{}' returned {} probabilities for {} rows",
                model.name(),
                probabilities.len(),
                candidates.len()
            )));
        }
        Ok(probabilities)
    }
}

/// Sort by score descending and keep the first `top_n`.
///
/// The sort is stable, so equal scores keep their input order. NaN scores
/// always sort last.
pub fn rank(mut scored: Vec<ScoredRow<'_>>, top_n: usize) -> Vec<ScoredRow<'_>> {
    scored.sort_by(|a, b| descending_nan_last(a.score, b.score));
    scored.truncate(top_n);
    scored
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    a.is_nan()
        .cmp(&b.is_nan())
        .then_with(|| b.partial_cmp(&a).unwrap_or(Ordering::Equal))
}
