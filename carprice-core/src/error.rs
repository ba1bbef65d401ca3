//! Error types for the carprice core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering schema validation, feature transformation, the regressor,
//! artifact persistence and pipeline orchestration.

use std::path::PathBuf;

/// Top-level error type for the carprice core library.
#[derive(Debug, thiserror::Error)]
pub enum CarPriceError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CarPriceError {
    /// Stable machine-readable code, used in serving error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::Feature(FeatureError::NotFitted) => "NOT_FITTED",
            Self::Feature(FeatureError::EmptyTrainingSet) => "EMPTY_TRAINING_SET",
            Self::Feature(FeatureError::DegenerateColumn { .. }) => "DEGENERATE_COLUMN",
            Self::Feature(FeatureError::WidthMismatch { .. }) => "WIDTH_MISMATCH",
            Self::Model(_) => "MODEL_ERROR",
            Self::Artifact(ArtifactError::NotFound { .. }) => "ARTIFACT_NOT_FOUND",
            Self::Artifact(ArtifactError::Corrupt { .. }) => "CORRUPT_ARTIFACT",
            Self::Artifact(ArtifactError::Incompatible { .. }) => "INCOMPATIBLE_ARTIFACT",
            Self::Pipeline(_) => "PIPELINE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Csv(_) => "CSV_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Errors from validating raw records against the schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("row {row}: missing required column '{column}'")]
    MissingColumn { row: usize, column: String },

    #[error("row {row}: column '{column}' is not a valid number: {value:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: column '{column}' value {value} violates {constraint}")]
    OutOfRange {
        row: usize,
        column: String,
        value: f64,
        constraint: &'static str,
    },

    #[error("row {row}: car name {value:?} does not contain a brand and a model")]
    InvalidCarName { row: usize, value: String },

    #[error("invalid payload: {message}")]
    InvalidPayload { message: String },
}

/// Errors from fitting or applying the feature transformer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeatureError {
    #[error("Feature transformer used before fit")]
    NotFitted,

    #[error("Cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("Numeric column '{column}' has zero variance")]
    DegenerateColumn { column: String },

    #[error("Feature width mismatch: expected {expected}, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },
}

/// Errors from the regressor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Cannot train a regressor on zero rows")]
    EmptyTrainingSet,

    #[error("Label count {labels} does not match row count {rows}")]
    LabelMismatch { rows: usize, labels: usize },

    #[error("Regressor expects {expected} features, got {actual}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("Regressor used before fit")]
    NotFitted,

    #[error("XGBoost error: {0}")]
    Booster(String),
}

/// Errors from loading or storing a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Model artifact at {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Model artifact at {path} has schema version {found}, runtime expects {expected}")]
    Incompatible {
        path: PathBuf,
        found: String,
        expected: String,
    },
}

/// Errors from pipeline orchestration.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("No CSV files found in {dir}")]
    NoInputFiles { dir: PathBuf },

    #[error("Stage {stage} requires {path}, which does not exist")]
    MissingStageInput { stage: String, path: PathBuf },

    #[error("{rows} record(s) have no Price label")]
    MissingLabels { rows: usize },

    #[error("Nothing left to {stage}: every row was rejected")]
    NoRows { stage: String },

    #[error("No labelled rows to evaluate")]
    EmptyEvaluationSet,
}

/// A type alias for results using the top-level `CarPriceError`.
pub type Result<T> = std::result::Result<T, CarPriceError>;
