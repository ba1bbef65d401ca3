//! The fitted feature transformer.

use super::{ColumnStats, FeatureMatrix, RareCategoryPolicy, Vocabulary, ZeroVariancePolicy};
use crate::error::{FeatureError, Result};
use crate::record::{CategoricalColumn, NumericColumn, RawRecord};
use crate::schema::{RawRow, Schema};
use serde::{Deserialize, Serialize};

/// Fit-time options of a [`FeatureTransformer`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    #[serde(default)]
    pub rare: RareCategoryPolicy,
    #[serde(default)]
    pub zero_variance: ZeroVariancePolicy,
}

/// State frozen by [`FeatureTransformer::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FittedState {
    numeric: Vec<(NumericColumn, ColumnStats)>,
    vocabularies: Vec<Vocabulary>,
    width: usize,
}

/// Maps listing records to a fixed-width feature matrix.
///
/// Output layout: the scaled numeric columns in [`NumericColumn::ALL`] order,
/// followed by one indicator block per categorical column in
/// [`CategoricalColumn::ALL`] order. Inside a block, slots follow the sorted
/// vocabulary. The layout is fixed at fit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    config: TransformerConfig,
    state: Option<FittedState>,
}

impl FeatureTransformer {
    pub fn new(config: TransformerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Learn vocabularies and scaling statistics from `records`.
    ///
    /// Refitting replaces all previously frozen state.
    pub fn fit(&mut self, records: &[RawRecord]) -> std::result::Result<&mut Self, FeatureError> {
        if records.is_empty() {
            return Err(FeatureError::EmptyTrainingSet);
        }

        let numeric = NumericColumn::ALL
            .iter()
            .map(|&column| {
                ColumnStats::fit(records, column, self.config.zero_variance)
                    .map(|stats| (column, stats))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut collapsed = records.to_vec();
        let report = self.config.rare.collapse(&mut collapsed);

        let vocabularies: Vec<Vocabulary> = CategoricalColumn::ALL
            .iter()
            .map(|&column| {
                let vocab = Vocabulary::build(
                    column,
                    collapsed.iter().map(|r| r.categorical(column)),
                    self.config.rare.applies_to(column),
                );
                tracing::debug!(
                    column = %column,
                    size = vocab.len(),
                    collapsed = report.collapsed_values(column),
                    "Froze vocabulary"
                );
                vocab
            })
            .collect();

        let width = numeric.len() + vocabularies.iter().map(Vocabulary::len).sum::<usize>();
        tracing::info!(rows = records.len(), width, "Fitted feature transformer");

        self.state = Some(FittedState {
            numeric,
            vocabularies,
            width,
        });
        Ok(self)
    }

    /// Validate raw rows against `schema`, then fit.
    pub fn fit_rows(&mut self, schema: &Schema, rows: &[RawRow]) -> Result<&mut Self> {
        let records = schema.validate(rows)?;
        Ok(self.fit(&records)?)
    }

    /// Transform `records` with the frozen state.
    ///
    /// Categories outside the vocabulary land in the `Other` slot when the
    /// column reserves one and leave the block all-zero otherwise.
    pub fn transform(
        &self,
        records: &[RawRecord],
    ) -> std::result::Result<FeatureMatrix, FeatureError> {
        let state = self.state()?;
        let mut matrix = FeatureMatrix::with_capacity(state.width, records.len());
        let mut row = vec![0.0; state.width];
        let mut unseen = 0usize;

        for record in records {
            row.fill(0.0);
            for (slot, (column, stats)) in state.numeric.iter().enumerate() {
                row[slot] = stats.scale(record.numeric(*column));
            }
            let mut offset = state.numeric.len();
            for vocab in &state.vocabularies {
                let value = record.categorical(vocab.column());
                if !vocab.contains(value) {
                    unseen += 1;
                }
                if let Some(slot) = vocab.resolve(value) {
                    row[offset + slot] = 1.0;
                }
                offset += vocab.len();
            }
            matrix.push_row(&row)?;
        }

        if unseen > 0 {
            tracing::debug!(unseen, rows = records.len(), "Unseen categories in batch");
        }
        Ok(matrix)
    }

    /// Validate raw rows against `schema`, then transform.
    pub fn transform_rows(&self, schema: &Schema, rows: &[RawRow]) -> Result<FeatureMatrix> {
        self.state()?;
        let records = schema.validate(rows)?;
        Ok(self.transform(&records)?)
    }

    pub fn width(&self) -> std::result::Result<usize, FeatureError> {
        Ok(self.state()?.width)
    }

    /// Output column names in frozen order.
    pub fn feature_names(&self) -> std::result::Result<Vec<String>, FeatureError> {
        let state = self.state()?;
        let mut names = Vec::with_capacity(state.width);
        for (column, _) in &state.numeric {
            names.push(format!("num__{column}"));
        }
        for vocab in &state.vocabularies {
            for value in vocab.values() {
                names.push(format!("cat__{}_{value}", vocab.column()));
            }
        }
        Ok(names)
    }

    pub fn vocabulary(&self, column: CategoricalColumn) -> Option<&Vocabulary> {
        self.state
            .as_ref()?
            .vocabularies
            .iter()
            .find(|v| v.column() == column)
    }

    pub fn stats(&self, column: NumericColumn) -> Option<ColumnStats> {
        self.state
            .as_ref()?
            .numeric
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, s)| *s)
    }

    fn state(&self) -> std::result::Result<&FittedState, FeatureError> {
        self.state.as_ref().ok_or(FeatureError::NotFitted)
    }
}
