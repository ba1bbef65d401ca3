//! Frozen per-column category vocabularies.

use super::OTHER;
use crate::record::CategoricalColumn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The sorted set of values a fitted transformer recognises for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    column: CategoricalColumn,
    /// Lexicographically sorted, unique.
    values: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from observed values, optionally reserving [`OTHER`].
    pub fn build<'a>(
        column: CategoricalColumn,
        observed: impl IntoIterator<Item = &'a str>,
        reserve_other: bool,
    ) -> Self {
        let mut set: BTreeSet<String> = observed.into_iter().map(str::to_string).collect();
        if reserve_other {
            set.insert(OTHER.to_string());
        }
        Self {
            column,
            values: set.into_iter().collect(),
        }
    }

    pub fn column(&self) -> CategoricalColumn {
        self.column
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn contains(&self, value: &str) -> bool {
        self.position(value).is_some()
    }

    pub fn has_other(&self) -> bool {
        self.contains(OTHER)
    }

    fn position(&self, value: &str) -> Option<usize> {
        self.values
            .binary_search_by(|entry| entry.as_str().cmp(value))
            .ok()
    }

    /// Indicator slot for `value`: its own slot if known, else the [`OTHER`]
    /// slot if reserved, else `None` (all-zero block).
    pub fn resolve(&self, value: &str) -> Option<usize> {
        self.position(value).or_else(|| self.position(OTHER))
    }
}
