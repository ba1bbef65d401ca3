//! Pricing unlabelled listings.

use crate::artifact::ModelArtifact;
use crate::error::Result;
use crate::record::{CategoricalColumn, RawRecord};
use crate::regressor::Regressor;
use crate::schema::{CAR_NAME_COLUMNS, PREDICTED_PRICE_COLUMN, RawRow, Schema};
use serde_json::Value;

/// Priced rows plus the header order to write them in.
#[derive(Debug, Clone, Default)]
pub struct PricedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Validate and price `rows`, returning each row annotated with its price.
///
/// Any invalid row fails the whole batch.
pub fn price_rows<R: Regressor>(
    artifact: &ModelArtifact<R>,
    schema: &Schema,
    rows: &[RawRow],
) -> Result<Vec<RawRow>> {
    let records = schema.validate(rows)?;
    let prices = artifact.predict_records(&records)?;
    Ok(rows
        .iter()
        .zip(&records)
        .zip(prices)
        .map(|((row, record), price)| annotate(row, record, price))
        .collect())
}

/// Price a CSV table, keeping its columns (minus the car name) and adding
/// `Brand`, `Model` and `Predicted_Price` where missing.
pub fn price_table<R: Regressor>(
    artifact: &ModelArtifact<R>,
    schema: &Schema,
    headers: &[String],
    rows: &[RawRow],
) -> Result<PricedTable> {
    let rows = price_rows(artifact, schema, rows)?;

    let mut out: Vec<String> = headers
        .iter()
        .filter(|h| !CAR_NAME_COLUMNS.contains(&h.as_str()))
        .cloned()
        .collect();
    for column in [
        CategoricalColumn::Brand.name(),
        CategoricalColumn::Model.name(),
        PREDICTED_PRICE_COLUMN,
    ] {
        if !out.iter().any(|h| h == column) {
            out.push(column.to_string());
        }
    }

    Ok(PricedTable { headers: out, rows })
}

/// Copy of `row` with the car name replaced by `Brand`/`Model` and the
/// predicted price added.
pub fn annotate(row: &RawRow, record: &RawRecord, price: f64) -> RawRow {
    let mut out = row.clone();
    for column in CAR_NAME_COLUMNS {
        out.remove(column);
    }
    out.insert(
        CategoricalColumn::Brand.name().to_string(),
        Value::String(record.brand.clone()),
    );
    out.insert(
        CategoricalColumn::Model.name().to_string(),
        Value::String(record.model.clone()),
    );
    out.insert(
        PREDICTED_PRICE_COLUMN.to_string(),
        serde_json::Number::from_f64(price).map_or(Value::Null, Value::Number),
    );
    out
}
