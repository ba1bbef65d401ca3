//! Standard scaling of numeric columns.

use crate::error::FeatureError;
use crate::record::{NumericColumn, RawRecord};
use serde::{Deserialize, Serialize};

/// What to do when a numeric column is constant over the training set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Scale with a standard deviation of 1.
    #[default]
    Substitute,
    /// Fail with [`FeatureError::DegenerateColumn`].
    Reject,
}

/// Frozen mean and standard deviation of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnStats {
    /// Population statistics of `column` over `records`.
    pub fn fit(
        records: &[RawRecord],
        column: NumericColumn,
        policy: ZeroVariancePolicy,
    ) -> Result<Self, FeatureError> {
        if records.is_empty() {
            return Err(FeatureError::EmptyTrainingSet);
        }
        let n = records.len() as f64;
        let mean = records.iter().map(|r| r.numeric(column)).sum::<f64>() / n;
        let variance = records
            .iter()
            .map(|r| {
                let d = r.numeric(column) - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        if std_dev > 0.0 && std_dev.is_finite() {
            return Ok(Self { mean, std_dev });
        }
        match policy {
            ZeroVariancePolicy::Substitute => {
                tracing::warn!(column = %column, mean, "Zero-variance column; scaling with std 1");
                Ok(Self { mean, std_dev: 1.0 })
            }
            ZeroVariancePolicy::Reject => Err(FeatureError::DegenerateColumn {
                column: column.name().to_string(),
            }),
        }
    }

    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}
