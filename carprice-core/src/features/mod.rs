//! Feature transformation: the frozen mapping from listing records to a
//! fixed-width numeric matrix.
//!
//! A [`FeatureTransformer`] is fitted once on training records and then
//! reused, unchanged, for evaluation, batch prediction and serving. Its
//! output width and column order never depend on which categories a later
//! batch happens to contain.

mod matrix;
mod rare;
mod scaler;
mod transformer;
mod vocabulary;

pub use matrix::FeatureMatrix;
pub use rare::{CollapseReport, RareCategoryPolicy};
pub use scaler::{ColumnStats, ZeroVariancePolicy};
pub use transformer::{FeatureTransformer, TransformerConfig};
pub use vocabulary::Vocabulary;

/// The reserved bucket that rare and unseen categories map to.
pub const OTHER: &str = "Other";
