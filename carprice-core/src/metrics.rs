//! Regression metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error metrics of a set of predictions against known prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rows: usize,
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
}

impl RegressionMetrics {
    /// Compute metrics. Both slices must have the same length.
    ///
    /// For constant targets R² is 1.0 on a perfect fit and 0.0 otherwise.
    pub fn compute(predictions: &[f64], targets: &[f64]) -> Self {
        debug_assert_eq!(predictions.len(), targets.len());
        let n = targets.len();
        if n == 0 {
            return Self {
                rows: 0,
                mae: 0.0,
                rmse: 0.0,
                r_squared: 0.0,
            };
        }
        let nf = n as f64;

        let (sum_abs, sum_sq) = predictions
            .iter()
            .zip(targets)
            .fold((0.0f64, 0.0f64), |(sa, ss), (&p, &y)| {
                let diff = p - y;
                (sa + diff.abs(), ss + diff * diff)
            });

        let mean = targets.iter().sum::<f64>() / nf;
        let total: f64 = targets.iter().map(|y| (y - mean) * (y - mean)).sum();
        let r_squared = if total > 0.0 {
            1.0 - sum_sq / total
        } else if sum_sq == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            rows: n,
            mae: sum_abs / nf,
            rmse: (sum_sq / nf).sqrt(),
            r_squared,
        }
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Evaluation Results ({} rows) ---", self.rows)?;
        writeln!(f, "MAE  : {:.2}", self.mae)?;
        writeln!(f, "RMSE : {:.2}", self.rmse)?;
        write!(f, "R²   : {:.3}", self.r_squared)
    }
}
