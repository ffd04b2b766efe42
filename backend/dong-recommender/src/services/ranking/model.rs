/// Probability Model Module
///
/// Growth and risk predictors sit behind one capability: batch-predict the
/// probability of the positive class. Two artifact kinds implement it:
/// ONNX-exported classifiers run with tract-onnx, and JSON logistic models.
use super::{RankingError, Result};
use crate::models::FeatureRow;
use crate::utils::sigmoid;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;
use tracing::{debug, info};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Batch predictor of a positive-class probability.
///
/// Implementations return exactly one probability per input row, in input
/// order. A batch the model cannot consume is an error, never a default.
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;

    fn predict_proba(&self, rows: &[&FeatureRow]) -> Result<Vec<f64>>;
}

/// Load a model artifact, picking the implementation by file extension.
///
/// `feature_columns` is the input column order for ONNX artifacts; logistic
/// artifacts carry their own column list.
pub fn load_model<P: AsRef<Path>>(
    path: P,
    feature_columns: &[String],
) -> Result<Arc<dyn ProbabilityModel>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let model: Arc<dyn ProbabilityModel> = match extension.as_deref() {
        Some("onnx") => Arc::new(OnnxClassifier::load(path, feature_columns.to_vec())?),
        Some("json") => Arc::new(LogisticModel::load(path)?),
        _ => {
            return Err(RankingError::ModelLoadError(format!(
                "Unsupported model artifact: {}",
                path.display()
            )))
        }
    };

    info!(model = model.name(), path = %path.display(), "Loaded probability model");
    Ok(model)
}

/// Build a `[rows, columns]` matrix; missing cells become NaN.
///
/// A row that does not carry one of the columns at all is rejected.
pub fn feature_matrix(rows: &[&FeatureRow], columns: &[String]) -> Result<Array2<f32>> {
    let fills = vec![f64::NAN; columns.len()];
    Ok(filled_matrix(rows, columns, &fills)?.mapv(|v| v as f32))
}

/// `[rows, columns]` f64 matrix with missing cells replaced by the
/// column's entry in `fills`.
fn filled_matrix(rows: &[&FeatureRow], columns: &[String], fills: &[f64]) -> Result<Array2<f64>> {
    let mut data = Vec::with_capacity(rows.len() * columns.len());
    for row in rows {
        for (column, fill) in columns.iter().zip(fills) {
            let value = row.features.get(column).ok_or_else(|| {
                RankingError::FeatureExtractionError(format!(
                    "Row {}/{}/{} has no '{}' column",
                    row.location_code, row.quarter, row.category_code, column
                ))
            })?;
            data.push(value.filter(|v| !v.is_nan()).unwrap_or(*fill));
        }
    }

    Array2::from_shape_vec((rows.len(), columns.len()), data).map_err(|e| {
        RankingError::FeatureExtractionError(format!("Failed to build feature matrix: {}", e))
    })
}

/// Binary classifier exported to ONNX.
pub struct OnnxClassifier {
    name: String,
    plan: Arc<OnnxPlan>,
    feature_columns: Vec<String>,
}

impl OnnxClassifier {
    pub fn load<P: AsRef<Path>>(path: P, feature_columns: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RankingError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }
        if feature_columns.is_empty() {
            return Err(RankingError::ModelLoadError(format!(
                "No feature columns configured for {}",
                path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                RankingError::ModelLoadError(format!("{}: {}", path.display(), e))
            })?;

        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("onnx")
            .to_string();

        debug!(model = %name, inputs = feature_columns.len(), "ONNX plan ready");

        Ok(Self {
            name,
            plan: Arc::new(plan),
            feature_columns,
        })
    }

    /// Positive-class probabilities from the plan outputs.
    ///
    /// Takes the first f32 output shaped `[batch, 2]` (column 1) or
    /// `[batch]` / `[batch, 1]`.
    fn positive_class(outputs: &[TValue], batch_size: usize) -> Result<Vec<f64>> {
        for output in outputs {
            if output.datum_type() != f32::datum_type() {
                continue;
            }
            let view = output.to_array_view::<f32>().map_err(|e| {
                RankingError::InferenceError(format!("Output extraction failed: {}", e))
            })?;
            let values: Vec<f32> = view.iter().copied().collect();

            match view.shape() {
                [n, 2] if *n == batch_size => {
                    return Ok(values.chunks(2).map(|pair| pair[1] as f64).collect())
                }
                [n] | [n, 1] if *n == batch_size => {
                    return Ok(values.into_iter().map(f64::from).collect())
                }
                _ => continue,
            }
        }

        Err(RankingError::InferenceError(format!(
            "No probability output for a batch of {}",
            batch_size
        )))
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, rows: &[&FeatureRow]) -> Result<Vec<f64>> {
        if rows.is_empty() {
            return Ok(vec![]);
        }

        let features = feature_matrix(rows, &self.feature_columns)?;
        let (batch_size, width) = features.dim();

        let input: Tensor =
            tract_ndarray::Array2::from_shape_fn((batch_size, width), |(i, j)| features[[i, j]])
                .into();
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| RankingError::InferenceError(format!("ONNX inference failed: {}", e)))?;

        Self::positive_class(&outputs, batch_size)
    }
}

/// Logistic regression artifact:
/// `p = sigmoid(intercept + Σ weight · value)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub name: String,
    pub intercept: f64,
    pub features: Vec<LogisticFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticFeature {
    pub name: String,
    pub weight: f64,
    /// Substitute for a missing value
    #[serde(default)]
    pub fill: f64,
}

impl LogisticModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RankingError::ModelLoadError(format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_reader(file)
            .map_err(|e| RankingError::ModelLoadError(format!("{}: {}", path.display(), e)))
    }
}

impl ProbabilityModel for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, rows: &[&FeatureRow]) -> Result<Vec<f64>> {
        let columns: Vec<String> = self.features.iter().map(|f| f.name.clone()).collect();
        let fills: Vec<f64> = self.features.iter().map(|f| f.fill).collect();

        let matrix = filled_matrix(rows, &columns, &fills)?;
        let weights = Array1::from_iter(self.features.iter().map(|f| f.weight));
        let logits = matrix.dot(&weights) + self.intercept;

        Ok(logits.iter().map(|&z| sigmoid(z)).collect())
    }
}
