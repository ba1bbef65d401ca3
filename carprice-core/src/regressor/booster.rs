//! Gradient-boosted regression trees trained by XGBoost.
//!
//! The fitted booster is held as its serialized model bytes, so the regressor
//! is `Send + Sync` and travels inside an artifact unchanged. A native booster
//! is rebuilt from those bytes for each prediction call.
//!
//! Labels are centred on their mean before boosting and the mean is added
//! back at prediction time.

use super::Regressor;
use crate::error::ModelError;
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};
use xgboost::parameters::{
    BoosterParameters, BoosterParametersBuilder, BoosterType, TrainingParametersBuilder, learning,
    tree,
};
use xgboost::{Booster, DMatrix, XGBError};

/// Training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtParams {
    /// Number of boosting rounds.
    pub n_trees: u32,
    /// Maximum depth of each tree.
    pub max_depth: u32,
    /// Shrinkage applied to every leaf weight (`eta`).
    pub learning_rate: f64,
    /// L2 regularisation on leaf weights (`lambda`).
    pub reg_lambda: f64,
    /// Minimum hessian sum per child.
    pub min_child_weight: f64,
    /// Minimum loss reduction for a split to be kept (`gamma`).
    pub min_split_gain: f64,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 6,
            learning_rate: 0.3,
            reg_lambda: 1.0,
            min_child_weight: 1.0,
            min_split_gain: 0.0,
        }
    }
}

impl GbdtParams {
    fn booster_params(&self) -> Result<BoosterParameters, ModelError> {
        let tree_params = tree::TreeBoosterParametersBuilder::default()
            .eta(self.learning_rate as f32)
            .gamma(self.min_split_gain as u32)
            .max_depth(self.max_depth)
            .min_child_weight(self.min_child_weight as u32)
            .lambda(self.reg_lambda as u32)
            .build()
            .map_err(|e| ModelError::Booster(e.to_string()))?;
        let learning_params = learning::LearningTaskParametersBuilder::default()
            .objective(learning::Objective::RegLinear)
            .build()
            .map_err(|e| ModelError::Booster(e.to_string()))?;
        BoosterParametersBuilder::default()
            .booster_type(BoosterType::Tree(tree_params))
            .learning_params(learning_params)
            .verbose(false)
            .build()
            .map_err(|e| ModelError::Booster(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedBooster {
    n_features: usize,
    base_score: f64,
    #[serde(with = "model_bytes")]
    model: Vec<u8>,
}

impl FittedBooster {
    fn booster(&self) -> Result<Booster, ModelError> {
        Booster::load_buffer(&self.model).map_err(booster_error)
    }
}

/// A fitted (or empty) boosted ensemble.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    params: GbdtParams,
    fitted: Option<FittedBooster>,
}

fn booster_error(e: XGBError) -> ModelError {
    ModelError::Booster(e.to_string())
}

fn dmatrix(features: &FeatureMatrix) -> Result<DMatrix, ModelError> {
    let values: Vec<f32> = features.as_slice().iter().map(|&v| v as f32).collect();
    DMatrix::from_dense(&values, features.n_rows()).map_err(booster_error)
}

/// XGBoost only writes models to a path; round-trip through a temp file.
fn serialize_booster(booster: &Booster) -> Result<Vec<u8>, ModelError> {
    let io_error = |e: std::io::Error| ModelError::Booster(e.to_string());
    let file = tempfile::NamedTempFile::new().map_err(io_error)?;
    booster.save(file.path()).map_err(booster_error)?;
    std::fs::read(file.path()).map_err(io_error)
}

impl GradientBoostedTrees {
    pub fn new(params: GbdtParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Mean training label; `None` before fit.
    pub fn base_score(&self) -> Option<f64> {
        self.fitted.as_ref().map(|f| f.base_score)
    }
}

impl Regressor for GradientBoostedTrees {
    fn name(&self) -> &'static str {
        "xgboost-gbtree"
    }

    fn fit(&mut self, features: &FeatureMatrix, labels: &[f64]) -> Result<(), ModelError> {
        let n_rows = features.n_rows();
        if n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if labels.len() != n_rows {
            return Err(ModelError::LabelMismatch {
                rows: n_rows,
                labels: labels.len(),
            });
        }

        let base_score = labels.iter().sum::<f64>() / n_rows as f64;
        let residuals: Vec<f32> = labels.iter().map(|&y| (y - base_score) as f32).collect();
        let mut dtrain = dmatrix(features)?;
        dtrain.set_labels(&residuals).map_err(booster_error)?;

        let training = TrainingParametersBuilder::default()
            .dtrain(&dtrain)
            .boost_rounds(self.params.n_trees)
            .booster_params(self.params.booster_params()?)
            .build()
            .map_err(|e| ModelError::Booster(e.to_string()))?;
        let booster = Booster::train(&training).map_err(booster_error)?;

        self.fitted = Some(FittedBooster {
            n_features: features.width(),
            base_score,
            model: serialize_booster(&booster)?,
        });
        tracing::debug!(
            rows = n_rows,
            width = features.width(),
            rounds = self.params.n_trees,
            base_score,
            "Fitted XGBoost regressor"
        );
        Ok(())
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        if features.width() != fitted.n_features {
            return Err(ModelError::WidthMismatch {
                expected: fitted.n_features,
                actual: features.width(),
            });
        }
        let n_rows = features.n_rows();
        if n_rows == 0 {
            return Ok(Vec::new());
        }

        let raw = fitted.booster()?.predict(&dmatrix(features)?).map_err(booster_error)?;
        if raw.len() != n_rows {
            return Err(ModelError::Booster(format!(
                "expected {n_rows} predictions, got {}",
                raw.len()
            )));
        }
        Ok(raw.iter().map(|&p| fitted.base_score + f64::from(p)).collect())
    }

    fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    fn check(&self) -> Result<(), ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        if fitted.n_features == 0 {
            return Err(ModelError::WidthMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let sample = FeatureMatrix::from_rows(fitted.n_features, &[vec![0.0; fitted.n_features]])
            .map_err(|e| ModelError::Booster(e.to_string()))?;
        self.predict(&sample).map(|_| ())
    }
}

/// Booster bytes as a base64 string, keeping the artifact payload JSON.
mod model_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}
