//! Dense row-major feature matrix.

use crate::error::FeatureError;

/// A batch of feature vectors sharing one width, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    width: usize,
    values: Vec<f64>,
}

impl FeatureMatrix {
    /// An empty matrix with room for `rows` rows.
    pub fn with_capacity(width: usize, rows: usize) -> Self {
        Self {
            width,
            values: Vec::with_capacity(width * rows),
        }
    }

    /// Build a matrix from explicit rows. Every row must have `width` entries.
    pub fn from_rows(width: usize, rows: &[Vec<f64>]) -> Result<Self, FeatureError> {
        let mut matrix = Self::with_capacity(width, rows.len());
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<(), FeatureError> {
        if row.len() != self.width {
            return Err(FeatureError::WidthMismatch {
                expected: self.width,
                actual: row.len(),
            });
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn n_rows(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.values.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The feature vector of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_rows()`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.width.max(1))
    }

    /// Value at (`row`, `col`).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}
