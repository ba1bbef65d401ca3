//! The batch pipeline: Clean, Train, then Evaluate or Predict.
//!
//! Each stage reads its inputs from disk, writes its outputs atomically and
//! can be re-run on its own. [`Pipeline`] wires the stage functions to the
//! configured paths.

pub mod clean;
pub mod evaluate;
pub mod predict;
pub mod split;
pub mod train;

pub use clean::{CleanOutcome, clean_rows};
pub use evaluate::evaluate;
pub use predict::{PricedTable, annotate, price_rows, price_table};
pub use split::train_test_split;
pub use train::{SplitOptions, TrainOutcome, train_model};

use crate::artifact::ModelArtifact;
use crate::config::{CarPriceConfig, PathsConfig};
use crate::dataset::{read_csv, write_records, write_rows};
use crate::error::{PipelineError, Result};
use crate::metrics::RegressionMetrics;
use crate::persistence::latest_file;
use crate::regressor::GradientBoostedTrees;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clean,
    Train,
    Evaluate,
    Predict,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Train => "train",
            Self::Evaluate => "evaluate",
            Self::Predict => "predict",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn require_input(stage: Stage, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(PipelineError::MissingStageInput {
            stage: stage.to_string(),
            path: path.to_path_buf(),
        }
        .into())
    }
}

/// Summary of a Clean run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub kept: usize,
    pub dropped: usize,
    pub output: PathBuf,
}

/// Summary of a Train run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub width: usize,
    pub holdout_metrics: Option<RegressionMetrics>,
    pub artifact: PathBuf,
}

/// Summary of a Predict run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictReport {
    pub input: PathBuf,
    pub rows: usize,
    pub output: PathBuf,
}

/// Summary of `clean` → `train` → `evaluate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub clean: CleanReport,
    pub train: TrainReport,
    /// `None` when the split left no held-out rows.
    pub metrics: Option<RegressionMetrics>,
}

/// Stage runner bound to a configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CarPriceConfig,
    schema: Schema,
}

impl Pipeline {
    /// Build a pipeline; relative paths in `config` resolve against `workspace`.
    pub fn new(mut config: CarPriceConfig, workspace: &Path) -> Self {
        config.paths = config.paths.resolved(workspace);
        Self {
            config,
            schema: Schema::current(),
        }
    }

    pub fn config(&self) -> &CarPriceConfig {
        &self.config
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.config.paths
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Raw CSV to cleaned CSV.
    pub fn clean(&self, input: Option<&Path>, output: Option<&Path>) -> Result<CleanReport> {
        let input = input.unwrap_or(self.config.paths.raw_data.as_path());
        let output = output.unwrap_or(self.config.paths.cleaned_data.as_path());
        require_input(Stage::Clean, input)?;
        let started = Instant::now();

        let table = read_csv(input)?;
        let policy = self.config.features.rare_policy();
        let outcome = clean_rows(&self.schema, &table.rows, &policy);
        if outcome.records.is_empty() {
            return Err(PipelineError::NoRows {
                stage: Stage::Clean.to_string(),
            }
            .into());
        }
        write_records(output, &self.schema, &outcome.records)?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            rows = table.row_count(),
            kept = outcome.records.len(),
            rejected = outcome.rejected,
            unlabelled = outcome.unlabelled,
            duration_ms = started.elapsed().as_millis() as u64,
            "Clean complete"
        );
        Ok(CleanReport {
            input_rows: table.row_count(),
            kept: outcome.records.len(),
            dropped: outcome.dropped(),
            output: output.to_path_buf(),
        })
    }

    /// Cleaned CSV to a persisted artifact and a held-out CSV.
    ///
    /// Nothing is written unless training succeeds.
    pub fn train(&self, input: Option<&Path>) -> Result<TrainReport> {
        let input = input.unwrap_or(self.config.paths.cleaned_data.as_path());
        require_input(Stage::Train, input)?;
        let started = Instant::now();

        let table = read_csv(input)?;
        let records = self.schema.validate(&table.rows)?;
        let training = &self.config.training;
        let outcome = train_model(
            &self.schema,
            &records,
            self.config.features.transformer_config(),
            GradientBoostedTrees::new(training.gbdt_params()),
            SplitOptions {
                test_fraction: training.test_fraction,
                seed: training.seed,
            },
        )?;

        let artifact_path = &self.config.paths.artifact;
        outcome.artifact.save(artifact_path)?;
        write_records(&self.config.paths.holdout_data, &self.schema, &outcome.holdout)?;

        let report = TrainReport {
            train_rows: outcome.train_rows,
            holdout_rows: outcome.holdout.len(),
            width: outcome.artifact.metadata().feature_names.len(),
            holdout_metrics: outcome.holdout_metrics,
            artifact: artifact_path.clone(),
        };
        tracing::info!(
            artifact = %artifact_path.display(),
            train_rows = report.train_rows,
            holdout_rows = report.holdout_rows,
            width = report.width,
            duration_ms = started.elapsed().as_millis() as u64,
            "Train complete"
        );
        Ok(report)
    }

    /// Score the persisted artifact on labelled data (the held-out set by default).
    pub fn evaluate(&self, input: Option<&Path>) -> Result<RegressionMetrics> {
        let input = input.unwrap_or(self.config.paths.holdout_data.as_path());
        require_input(Stage::Evaluate, input)?;

        let artifact: ModelArtifact =
            ModelArtifact::load_expecting(&self.config.paths.artifact, &self.schema)?;
        let table = read_csv(input)?;
        let records = self.schema.validate(&table.rows)?;
        let metrics = evaluate(&artifact, &records)?;
        tracing::info!(
            input = %input.display(),
            rows = metrics.rows,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r_squared = metrics.r_squared,
            "Evaluate complete"
        );
        Ok(metrics)
    }

    /// Price a CSV file; by default the latest file in the new-data directory.
    pub fn predict(&self, input: Option<&Path>, output: Option<&Path>) -> Result<PredictReport> {
        let input = match input {
            Some(path) => {
                require_input(Stage::Predict, path)?;
                path.to_path_buf()
            }
            None => self.latest_new_data()?,
        };
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.paths.predictions_output());

        let artifact: ModelArtifact =
            ModelArtifact::load_expecting(&self.config.paths.artifact, &self.schema)?;
        let table = read_csv(&input)?;
        let priced = price_table(&artifact, &self.schema, &table.headers, &table.rows)?;
        write_rows(&output, &priced.headers, &priced.rows)?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            rows = priced.rows.len(),
            "Predict complete"
        );
        Ok(PredictReport {
            input,
            rows: priced.rows.len(),
            output,
        })
    }

    /// Clean, Train and Evaluate in order with the configured paths.
    pub fn run_all(&self) -> Result<RunReport> {
        let clean = self.clean(None, None)?;
        let train = self.train(None)?;
        let metrics = if train.holdout_rows == 0 {
            tracing::warn!(
                train_rows = train.train_rows,
                "Held-out set is empty; skipping evaluate"
            );
            None
        } else {
            Some(self.evaluate(None)?)
        };
        Ok(RunReport {
            clean,
            train,
            metrics,
        })
    }

    fn latest_new_data(&self) -> Result<PathBuf> {
        let dir = &self.config.paths.new_data_dir;
        require_input(Stage::Predict, dir)?;
        latest_file(dir, "csv")?.ok_or_else(|| {
            PipelineError::NoInputFiles {
                dir: dir.to_path_buf(),
            }
            .into()
        })
    }
}
