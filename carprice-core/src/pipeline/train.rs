//! Cleaned records to a fitted model artifact.

use super::evaluate::evaluate;
use super::split::train_test_split;
use crate::artifact::ModelArtifact;
use crate::error::Result;
use crate::features::TransformerConfig;
use crate::metrics::RegressionMetrics;
use crate::record::RawRecord;
use crate::regressor::Regressor;
use crate::schema::Schema;

/// Split settings for [`train_model`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitOptions {
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// A trained artifact plus the rows it never saw.
#[derive(Debug, Clone)]
pub struct TrainOutcome<R> {
    pub artifact: ModelArtifact<R>,
    pub train_rows: usize,
    pub holdout: Vec<RawRecord>,
    /// Metrics on `holdout`, when it is non-empty.
    pub holdout_metrics: Option<RegressionMetrics>,
}

/// Split `records`, then fit transformer and regressor on the training part.
pub fn train_model<R: Regressor>(
    schema: &Schema,
    records: &[RawRecord],
    transformer: TransformerConfig,
    regressor: R,
    split: SplitOptions,
) -> Result<TrainOutcome<R>> {
    let (train, holdout) = train_test_split(records, split.test_fraction, split.seed);
    tracing::info!(
        train_rows = train.len(),
        holdout_rows = holdout.len(),
        seed = split.seed,
        "Split cleaned data"
    );

    let artifact = ModelArtifact::train(schema, transformer, regressor, &train)?;
    tracing::info!(
        width = artifact.metadata().feature_names.len(),
        regressor = %artifact.metadata().regressor,
        "Fitted feature transformer and regressor"
    );

    let holdout_metrics = if holdout.is_empty() {
        None
    } else {
        let metrics = evaluate(&artifact, &holdout)?;
        tracing::info!(
            rows = metrics.rows,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r_squared = metrics.r_squared,
            "Held-out metrics"
        );
        Some(metrics)
    };

    Ok(TrainOutcome {
        artifact,
        train_rows: train.len(),
        holdout,
        holdout_metrics,
    })
}
