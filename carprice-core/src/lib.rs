//! # carprice-core
//!
//! Used-car price prediction built around one frozen feature-transformation
//! contract. A [`FeatureTransformer`] is fitted once on cleaned training
//! records, bundled with a fitted regressor into a [`ModelArtifact`], and the
//! same artifact is then used for evaluation, batch prediction and serving.

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod metrics;
pub mod persistence;
pub mod pipeline;
pub mod record;
pub mod regressor;
pub mod schema;
pub mod server;

pub use artifact::{ArtifactMetadata, ModelArtifact};
pub use config::{CarPriceConfig, config_exists, load_config};
pub use error::{
    ArtifactError, CarPriceError, FeatureError, ModelError, PipelineError, Result, SchemaError,
};
pub use features::{FeatureMatrix, FeatureTransformer, RareCategoryPolicy, TransformerConfig};
pub use metrics::RegressionMetrics;
pub use pipeline::{Pipeline, Stage};
pub use record::{CategoricalColumn, NumericColumn, RawRecord};
pub use regressor::{GbdtParams, GradientBoostedTrees, Regressor};
pub use schema::{RawRow, SCHEMA_VERSION, Schema};
