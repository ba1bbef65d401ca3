//! Scoring an artifact against labelled records.

use crate::artifact::ModelArtifact;
use crate::error::{PipelineError, Result};
use crate::metrics::RegressionMetrics;
use crate::record::RawRecord;
use crate::regressor::Regressor;

/// MAE, RMSE and R² of `artifact` on `records`. Every record needs a price.
pub fn evaluate<R: Regressor>(
    artifact: &ModelArtifact<R>,
    records: &[RawRecord],
) -> Result<RegressionMetrics> {
    if records.is_empty() {
        return Err(PipelineError::EmptyEvaluationSet.into());
    }
    let targets: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    if targets.len() != records.len() {
        return Err(PipelineError::MissingLabels {
            rows: records.len() - targets.len(),
        }
        .into());
    }
    let predictions = artifact.predict_records(records)?;
    Ok(RegressionMetrics::compute(&predictions, &targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarPriceError;
    use crate::features::TransformerConfig;
    use crate::regressor::{GbdtParams, GradientBoostedTrees};
    use crate::schema::Schema;

    fn record(year: i64, price: Option<f64>) -> RawRecord {
        RawRecord {
            year,
            distance: 20_000,
            owner: 1,
            fuel: "DIESEL".into(),
            location: "TN-10".into(),
            drive: "Automatic".into(),
            body_type: "SUV".into(),
            brand: "Mahindra".into(),
            model: "XUV500".into(),
            price,
        }
    }

    fn artifact() -> ModelArtifact {
        let train: Vec<_> = (0..20)
            .map(|i| record(2010 + i, Some(200_000.0 + i as f64 * 50_000.0)))
            .collect();
        ModelArtifact::train(
            &Schema::current(),
            TransformerConfig::default(),
            GradientBoostedTrees::new(GbdtParams {
                n_trees: 30,
                ..Default::default()
            }),
            &train,
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_on_training_like_rows() {
        let metrics = evaluate(&artifact(), &[record(2015, Some(450_000.0))]).unwrap();
        assert_eq!(metrics.rows, 1);
        assert!(metrics.mae < 50_000.0, "mae {}", metrics.mae);
    }

    #[test]
    fn test_evaluate_requires_labels() {
        let err = evaluate(&artifact(), &[record(2015, None)]).unwrap_err();
        assert!(matches!(
            err,
            CarPriceError::Pipeline(PipelineError::MissingLabels { rows: 1 })
        ));
    }

    #[test]
    fn test_evaluate_empty() {
        let err = evaluate(&artifact(), &[]).unwrap_err();
        assert!(matches!(
            err,
            CarPriceError::Pipeline(PipelineError::EmptyEvaluationSet)
        ));
        assert_eq!(err.to_string(), "Pipeline error: No labelled rows to evaluate");
    }
}
