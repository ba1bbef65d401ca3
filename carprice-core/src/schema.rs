//! Schema definition and validation of raw listing rows.
//!
//! The schema is the single source of truth for which columns a listing must
//! carry and how each one is interpreted. Raw rows arrive untyped (CSV cells or
//! JSON objects) and are turned into [`RawRecord`]s here, before any feature
//! transformation happens.

use crate::error::SchemaError;
use crate::record::{CategoricalColumn, NumericColumn, RawRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Version of the column contract. Persisted in every model artifact.
pub const SCHEMA_VERSION: &str = "v1";

/// Header spellings accepted for the combined car-name column.
pub const CAR_NAME_COLUMNS: [&str; 2] = ["Car Name", "CarName"];

/// Name of the label column.
pub const PRICE_COLUMN: &str = "Price";

/// Name of the column appended by prediction.
pub const PREDICTED_PRICE_COLUMN: &str = "Predicted_Price";

/// An untyped input row keyed by column header.
pub type RawRow = serde_json::Map<String, Value>;

/// How a column participates in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    /// Not consumed directly; split into other columns.
    Derived,
    Target,
}

/// Schema for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Whether every validated record must carry a value.
    pub required: bool,
}

const COLUMNS: [ColumnSchema; 11] = [
    ColumnSchema { name: "Year", kind: ColumnKind::Numeric, required: true },
    ColumnSchema { name: "Distance", kind: ColumnKind::Numeric, required: true },
    ColumnSchema { name: "Owner", kind: ColumnKind::Numeric, required: true },
    ColumnSchema { name: "Fuel", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Location", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Drive", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Type", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Brand", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Model", kind: ColumnKind::Categorical, required: true },
    ColumnSchema { name: "Car Name", kind: ColumnKind::Derived, required: false },
    ColumnSchema { name: "Price", kind: ColumnKind::Target, required: false },
];

/// The declarative column contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    version: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self::current()
    }
}

impl Schema {
    /// The schema this build of the library implements.
    pub fn current() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// A schema pinned to an explicit version string.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn columns(&self) -> &'static [ColumnSchema] {
        &COLUMNS
    }

    /// Canonical output header for cleaned records.
    pub fn record_headers(&self) -> Vec<&'static str> {
        COLUMNS
            .iter()
            .filter(|c| c.kind != ColumnKind::Derived)
            .map(|c| c.name)
            .collect()
    }

    /// Validate a batch, failing on the first invalid row.
    pub fn validate(&self, rows: &[RawRow]) -> Result<Vec<RawRecord>, SchemaError> {
        rows.iter()
            .enumerate()
            .map(|(i, row)| self.validate_row(i, row))
            .collect()
    }

    /// Validate one row. `index` is only used for error messages.
    pub fn validate_row(&self, index: usize, row: &RawRow) -> Result<RawRecord, SchemaError> {
        let (brand, model) = resolve_brand_model(index, row)?;

        let year = integer_field(index, row, NumericColumn::Year.name())?;
        let distance = integer_field(index, row, NumericColumn::Distance.name())?;
        if distance < 0 {
            return Err(SchemaError::OutOfRange {
                row: index,
                column: NumericColumn::Distance.name().into(),
                value: distance as f64,
                constraint: "Distance >= 0",
            });
        }
        let owner = integer_field(index, row, NumericColumn::Owner.name())?;
        if owner < 1 {
            return Err(SchemaError::OutOfRange {
                row: index,
                column: NumericColumn::Owner.name().into(),
                value: owner as f64,
                constraint: "Owner >= 1",
            });
        }

        let price = match cell(row, PRICE_COLUMN) {
            None => None,
            Some(value) => {
                let price = parse_number(index, PRICE_COLUMN, value)?;
                if price <= 0.0 {
                    return Err(SchemaError::OutOfRange {
                        row: index,
                        column: PRICE_COLUMN.into(),
                        value: price,
                        constraint: "Price > 0",
                    });
                }
                Some(price)
            }
        };

        Ok(RawRecord {
            year,
            distance,
            owner,
            fuel: text_field(index, row, CategoricalColumn::Fuel.name())?,
            location: text_field(index, row, CategoricalColumn::Location.name())?,
            drive: text_field(index, row, CategoricalColumn::Drive.name())?,
            body_type: text_field(index, row, CategoricalColumn::Type.name())?,
            brand,
            model,
            price,
        })
    }
}

/// Split a free-text car name into `(brand, model)`.
///
/// The first whitespace token is the brand; up to two following tokens,
/// joined by a single space, form the model.
pub fn split_car_name(name: &str) -> Option<(String, String)> {
    let mut tokens = name.split_whitespace();
    let brand = tokens.next()?;
    let model: Vec<&str> = tokens.take(2).collect();
    if model.is_empty() {
        return None;
    }
    Some((brand.to_string(), model.join(" ")))
}

/// Returns the raw car-name value of a row under any accepted header.
pub fn car_name(row: &RawRow) -> Option<&Value> {
    CAR_NAME_COLUMNS.iter().find_map(|c| cell(row, c))
}

fn resolve_brand_model(index: usize, row: &RawRow) -> Result<(String, String), SchemaError> {
    let brand = cell(row, "Brand").map(render_text);
    let model = cell(row, "Model").map(render_text);
    if let (Some(brand), Some(model)) = (&brand, &model) {
        return Ok((brand.clone(), model.clone()));
    }

    let Some(name) = car_name(row) else {
        let column = if brand.is_none() { "Brand" } else { "Model" };
        return Err(SchemaError::MissingColumn {
            row: index,
            column: column.into(),
        });
    };
    let name = render_text(name);
    let (derived_brand, derived_model) =
        split_car_name(&name).ok_or_else(|| SchemaError::InvalidCarName {
            row: index,
            value: name.clone(),
        })?;
    Ok((
        brand.unwrap_or(derived_brand),
        model.unwrap_or(derived_model),
    ))
}

/// A cell that is present and non-null. Blank strings count as null.
fn cell<'a>(row: &'a RawRow, column: &str) -> Option<&'a Value> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        value => Some(value),
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn text_field(index: usize, row: &RawRow, column: &str) -> Result<String, SchemaError> {
    cell(row, column)
        .map(render_text)
        .ok_or_else(|| SchemaError::MissingColumn {
            row: index,
            column: column.into(),
        })
}

fn parse_number(index: usize, column: &str, value: &Value) -> Result<f64, SchemaError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| SchemaError::InvalidNumber {
            row: index,
            column: column.into(),
            value: render_text(value),
        })
}

fn integer_field(index: usize, row: &RawRow, column: &str) -> Result<i64, SchemaError> {
    let value = cell(row, column).ok_or_else(|| SchemaError::MissingColumn {
        row: index,
        column: column.into(),
    })?;
    let number = parse_number(index, column, value)?;
    if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
        return Err(SchemaError::InvalidNumber {
            row: index,
            column: column.into(),
            value: render_text(value),
        });
    }
    Ok(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn creta() -> RawRow {
        row(json!({
            "Year": 2020, "Distance": 35000, "Owner": 1, "Fuel": "PETROL",
            "Location": "KA-05", "Drive": "Manual", "Type": "SUV",
            "Brand": "Hyundai", "Model": "Creta"
        }))
    }

    #[test]
    fn test_validate_typed_json_row() {
        let record = Schema::current().validate_row(0, &creta()).unwrap();
        assert_eq!(record.year, 2020);
        assert_eq!(record.brand, "Hyundai");
        assert_eq!(record.price, None);
    }

    #[test]
    fn test_validate_string_cells_from_csv() {
        let r = row(json!({
            "Unnamed: 0": "0", "Car Name": "Maruti Swift Dzire VXI", "Year": "2017",
            "Distance": "45000", "Owner": "2", "Fuel": "PETROL", "Location": "HR-98",
            "Drive": "Manual", "Type": "Sedan", "Price": "561000"
        }));
        let record = Schema::current().validate_row(0, &r).unwrap();
        assert_eq!(record.brand, "Maruti");
        assert_eq!(record.model, "Swift Dzire");
        assert_eq!(record.owner, 2);
        assert_eq!(record.price, Some(561000.0));
    }

    #[test]
    fn test_explicit_brand_wins_over_car_name() {
        let mut r = creta();
        r.insert("CarName".into(), json!("Kia Seltos HTX"));
        let record = Schema::current().validate_row(0, &r).unwrap();
        assert_eq!(record.brand, "Hyundai");
        assert_eq!(record.model, "Creta");
    }

    #[test]
    fn test_split_car_name() {
        assert_eq!(
            split_car_name("Honda City  ZX  CVT"),
            Some(("Honda".into(), "City ZX".into()))
        );
        assert_eq!(split_car_name("Tata Nexon"), Some(("Tata".into(), "Nexon".into())));
        assert_eq!(split_car_name("Tata"), None);
        assert_eq!(split_car_name("   "), None);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut r = creta();
        r.remove("Fuel");
        let err = Schema::current().validate(&[creta(), r]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                row: 1,
                column: "Fuel".into()
            }
        );
    }

    #[test]
    fn test_null_and_blank_cells_are_missing() {
        let mut r = creta();
        r.insert("Drive".into(), Value::Null);
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::MissingColumn { .. })
        ));

        let mut r = creta();
        r.insert("Type".into(), json!("  "));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_brand_model_without_car_name_fails() {
        let mut r = creta();
        r.remove("Model");
        assert_eq!(
            Schema::current().validate_row(4, &r).unwrap_err(),
            SchemaError::MissingColumn {
                row: 4,
                column: "Model".into()
            }
        );
    }

    #[test]
    fn test_non_numeric_year_fails() {
        let mut r = creta();
        r.insert("Year".into(), json!("twenty"));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::InvalidNumber { .. })
        ));

        r.insert("Year".into(), json!(2020.5));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_price_must_be_positive() {
        let mut r = creta();
        r.insert("Price".into(), json!(0));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_negative_distance_and_zero_owner_fail() {
        let mut r = creta();
        r.insert("Distance".into(), json!(-5));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::OutOfRange { .. })
        ));

        let mut r = creta();
        r.insert("Owner".into(), json!(0));
        assert!(matches!(
            Schema::current().validate_row(0, &r),
            Err(SchemaError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_record_headers_exclude_car_name() {
        let headers = Schema::current().record_headers();
        assert_eq!(headers.first(), Some(&"Year"));
        assert_eq!(headers.last(), Some(&"Price"));
        assert!(!headers.contains(&"Car Name"));
    }
}
