//! Raw listings to cleaned, labelled records.

use crate::features::{CollapseReport, RareCategoryPolicy};
use crate::record::RawRecord;
use crate::schema::{RawRow, Schema};

/// Result of cleaning one raw table.
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<RawRecord>,
    /// Rows that failed schema validation.
    pub rejected: usize,
    /// Valid rows dropped for lacking a price.
    pub unlabelled: usize,
    pub collapsed: CollapseReport,
}

impl CleanOutcome {
    pub fn dropped(&self) -> usize {
        self.rejected + self.unlabelled
    }
}

/// Validate every row, drop the ones that fail or carry no price, then
/// collapse rare categories using counts from the surviving rows only.
pub fn clean_rows(schema: &Schema, rows: &[RawRow], policy: &RareCategoryPolicy) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    for (index, row) in rows.iter().enumerate() {
        match schema.validate_row(index, row) {
            Ok(record) if record.price.is_some() => outcome.records.push(record),
            Ok(_) => outcome.unlabelled += 1,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping row");
                outcome.rejected += 1;
            }
        }
    }

    outcome.collapsed = policy.collapse(&mut outcome.records);
    outcome
}
