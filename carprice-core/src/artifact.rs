//! The persisted model artifact: a fitted transformer, a fitted regressor and
//! the schema version they were trained against.
//!
//! On disk the artifact is a JSON envelope holding the schema version, a
//! SHA-256 checksum and the serialized payload. Loading checks the envelope
//! before touching the payload, so a stale or damaged file is rejected with
//! a typed error instead of producing wrong prices.

use crate::error::{ArtifactError, PipelineError, Result};
use crate::features::{FeatureTransformer, TransformerConfig};
use crate::persistence::atomic_write;
use crate::record::RawRecord;
use crate::regressor::{GradientBoostedTrees, Regressor};
use crate::schema::{RawRow, Schema};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

const ARTIFACT_FORMAT: &str = "carprice-model";
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Descriptive fields recorded at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub regressor: String,
    pub training_rows: usize,
    pub feature_names: Vec<String>,
}

/// A fitted transformer and regressor, bundled as the single unit that is
/// persisted, loaded and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact<R = GradientBoostedTrees> {
    schema_version: String,
    metadata: ArtifactMetadata,
    transformer: FeatureTransformer,
    regressor: R,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    format: String,
    format_version: u32,
    schema_version: String,
    sha256: String,
    payload: String,
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl<R: Regressor> ModelArtifact<R> {
    /// Fit a transformer and `regressor` on labelled `records`.
    ///
    /// Fails without producing an artifact if any record lacks a price, the
    /// set is empty, or fitting fails.
    pub fn train(
        schema: &Schema,
        config: TransformerConfig,
        mut regressor: R,
        records: &[RawRecord],
    ) -> Result<Self> {
        let labels = labels(records)?;
        let mut transformer = FeatureTransformer::new(config);
        transformer.fit(records)?;
        let features = transformer.transform(records)?;
        regressor.fit(&features, &labels)?;
        Self::from_parts(schema, transformer, regressor, records.len())
    }

    /// Bundle an already fitted transformer and regressor.
    pub fn from_parts(
        schema: &Schema,
        transformer: FeatureTransformer,
        regressor: R,
        training_rows: usize,
    ) -> Result<Self> {
        let metadata = ArtifactMetadata {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            regressor: regressor.name().to_string(),
            training_rows,
            feature_names: transformer.feature_names()?,
        };
        Ok(Self {
            schema_version: schema.version().to_string(),
            metadata,
            transformer,
            regressor,
        })
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// One price per raw row, in input order. Rows are validated first.
    pub fn predict(&self, rows: &[RawRow]) -> Result<Vec<f64>> {
        let records = Schema::current().validate(rows)?;
        self.predict_records(&records)
    }

    /// One price per validated record, in input order.
    pub fn predict_records(&self, records: &[RawRecord]) -> Result<Vec<f64>> {
        let features = self.transformer.transform(records)?;
        Ok(self.regressor.predict(&features)?)
    }
}

impl<R: Regressor + Serialize + DeserializeOwned> ModelArtifact<R> {
    /// Persist atomically: a reader sees either the previous file or this one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string(self)?;
        let envelope = Envelope {
            format: ARTIFACT_FORMAT.to_string(),
            format_version: ARTIFACT_FORMAT_VERSION,
            schema_version: self.schema_version.clone(),
            sha256: checksum(&payload),
            payload,
        };
        atomic_write(path, &serde_json::to_vec(&envelope)?)?;
        tracing::info!(
            path = %path.display(),
            id = %self.metadata.id,
            schema_version = %self.schema_version,
            "Saved model artifact"
        );
        Ok(())
    }

    /// Load an artifact built for the current schema.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_expecting(path, &Schema::current())
    }

    /// Load an artifact, requiring its schema version to match `schema`.
    pub fn load_expecting(path: &Path, schema: &Schema) -> Result<Self> {
        let corrupt = |reason: String| ArtifactError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArtifactError::NotFound {
                    path: path.to_path_buf(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| corrupt(format!("unreadable envelope: {e}")))?;
        if envelope.format != ARTIFACT_FORMAT || envelope.format_version != ARTIFACT_FORMAT_VERSION
        {
            return Err(corrupt(format!(
                "unknown format {} v{}",
                envelope.format, envelope.format_version
            ))
            .into());
        }
        if envelope.schema_version != schema.version() {
            return Err(ArtifactError::Incompatible {
                path: path.to_path_buf(),
                found: envelope.schema_version,
                expected: schema.version().to_string(),
            }
            .into());
        }
        if checksum(&envelope.payload) != envelope.sha256 {
            return Err(corrupt("checksum mismatch".to_string()).into());
        }

        let artifact: Self = serde_json::from_str(&envelope.payload)
            .map_err(|e| corrupt(format!("unreadable payload: {e}")))?;
        if artifact.schema_version != envelope.schema_version {
            return Err(corrupt("payload schema version differs from envelope".to_string()).into());
        }
        let width = artifact
            .transformer
            .width()
            .map_err(|e| corrupt(e.to_string()))?;
        match artifact.regressor.n_features() {
            Some(n) if n == width => {}
            Some(n) => {
                return Err(corrupt(format!(
                    "regressor expects {n} features, transformer produces {width}"
                ))
                .into());
            }
            None => return Err(corrupt("regressor is not fitted".to_string()).into()),
        }
        artifact
            .regressor
            .check()
            .map_err(|e| corrupt(e.to_string()))?;

        tracing::info!(
            path = %path.display(),
            id = %artifact.metadata.id,
            created_at = %artifact.metadata.created_at,
            "Loaded model artifact"
        );
        Ok(artifact)
    }
}

fn labels(records: &[RawRecord]) -> Result<Vec<f64>> {
    let labels: Vec<f64> = records.iter().filter_map(|r| r.price).collect();
    if labels.len() != records.len() {
        return Err(PipelineError::MissingLabels {
            rows: records.len() - labels.len(),
        }
        .into());
    }
    Ok(labels)
}
