/// Ranking Module
///
/// Scores the categories of one (dong, quarter) slice with two binary
/// classifiers and orders them by `growth - alpha * risk`.
///
/// # Architecture
/// - **Model Layer**: `ProbabilityModel` capability, backed by ONNX
///   (tract-onnx) or JSON logistic artifacts
/// - **Scoring Layer**: batch inference of both models + score combination
///
/// # Workflow
/// 1. Run growth and risk inference over the whole candidate batch
/// 2. Combine per row: `score = p_growth - alpha * p_risk`
/// 3. Stable sort by score (descending) and truncate to `top_n`
pub mod model;
pub mod scorer;

pub use model::{load_model, LogisticModel, OnnxClassifier, ProbabilityModel};
pub use scorer::{combined_score, rank, RankingScorer, ScoredRow};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Feature extraction failed: {0}")]
    FeatureExtractionError(String),

    #[error("Model inference failed: {0}")]
    InferenceError(String),
}

pub type Result<T> = std::result::Result<T, RankingError>;
