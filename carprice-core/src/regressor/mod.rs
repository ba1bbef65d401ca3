//! The regression capability behind a [`ModelArtifact`](crate::artifact::ModelArtifact).
//!
//! Any type implementing [`Regressor`] can be bundled into an artifact; the
//! default is [`GradientBoostedTrees`], an XGBoost booster.

mod booster;

pub use booster::{GbdtParams, GradientBoostedTrees};

use crate::error::ModelError;
use crate::features::FeatureMatrix;

/// A trainable regressor over dense feature matrices.
pub trait Regressor {
    /// Short identifier recorded in artifact metadata.
    fn name(&self) -> &'static str;

    /// Train on `features` with one label per row. Replaces prior state.
    fn fit(&mut self, features: &FeatureMatrix, labels: &[f64]) -> Result<(), ModelError>;

    /// One prediction per row, in row order.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;

    /// Feature width the fitted model expects, `None` before fit.
    fn n_features(&self) -> Option<usize>;

    /// Confirm that fitted state restored from storage is usable.
    fn check(&self) -> Result<(), ModelError> {
        self.n_features().map(|_| ()).ok_or(ModelError::NotFitted)
    }
}
