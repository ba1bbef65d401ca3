//! Rare-category collapsing.

use super::OTHER;
use crate::record::{CategoricalColumn, RawRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Frequency threshold below which a categorical value is remapped to
/// [`OTHER`].
///
/// Only the listed columns are collapsed; low-cardinality columns such as
/// `Fuel` keep every observed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RareCategoryPolicy {
    pub threshold: usize,
    pub columns: Vec<CategoricalColumn>,
}

impl Default for RareCategoryPolicy {
    fn default() -> Self {
        Self {
            threshold: 20,
            columns: vec![CategoricalColumn::Model],
        }
    }
}

/// Values collapsed by one [`RareCategoryPolicy::collapse`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    pub collapsed: BTreeMap<CategoricalColumn, BTreeSet<String>>,
}

impl CollapseReport {
    pub fn collapsed_values(&self, column: CategoricalColumn) -> usize {
        self.collapsed.get(&column).map_or(0, BTreeSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.values().all(BTreeSet::is_empty)
    }
}

impl RareCategoryPolicy {
    pub fn new(threshold: usize, columns: Vec<CategoricalColumn>) -> Self {
        Self { threshold, columns }
    }

    pub fn with_column(mut self, column: CategoricalColumn) -> Self {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self
    }

    pub fn applies_to(&self, column: CategoricalColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Values of `column` occurring fewer than `threshold` times in `records`.
    pub fn rare_values(&self, records: &[RawRecord], column: CategoricalColumn) -> BTreeSet<String> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for record in records {
            *counts.entry(record.categorical(column)).or_default() += 1;
        }
        counts
            .into_iter()
            .filter(|(value, count)| *count < self.threshold && *value != OTHER)
            .map(|(value, _)| value.to_string())
            .collect()
    }

    /// Remap rare values in place. Frequencies come from `records` only.
    pub fn collapse(&self, records: &mut [RawRecord]) -> CollapseReport {
        let mut report = CollapseReport::default();
        for &column in &self.columns {
            let rare = self.rare_values(records, column);
            if rare.is_empty() {
                continue;
            }
            for record in records.iter_mut() {
                if rare.contains(record.categorical(column)) {
                    record.set_categorical(column, OTHER);
                }
            }
            tracing::debug!(column = %column, collapsed = rare.len(), "Collapsed rare categories");
            report.collapsed.insert(column, rare);
        }
        report
    }
}
