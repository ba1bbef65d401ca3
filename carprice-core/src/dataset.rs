//! CSV ingestion and output for listing data.

use crate::error::Result;
use crate::persistence::atomic_write;
use crate::record::RawRecord;
use crate::schema::{RawRow, Schema};
use serde_json::Value;
use std::io;
use std::path::Path;

/// A parsed CSV file: the header row plus one untyped row per record.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl CsvTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Index columns written by dataframe exports; carried no information.
fn is_index_column(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed:")
}

/// Read a CSV file with a header row.
pub fn read_csv(path: &Path) -> Result<CsvTable> {
    let file = std::fs::File::open(path)?;
    let table = read_csv_from(file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.headers.len(),
        "Loaded CSV"
    );
    Ok(table)
}

/// Read CSV data with a header row from any reader.
pub fn read_csv_from<R: io::Read>(reader: R) -> Result<CsvTable> {
    // Short rows are kept; their missing cells read as null and fail validation.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let all_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let keep: Vec<(usize, String)> = all_headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_index_column(h))
        .map(|(i, h)| (i, h.clone()))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (i, header) in &keep {
            let cell = record.get(*i).unwrap_or("");
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(CsvTable {
        headers: keep.into_iter().map(|(_, h)| h).collect(),
        rows,
    })
}

/// Write validated records in canonical column order.
pub fn write_records(path: &Path, schema: &Schema, records: &[RawRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(schema.record_headers())?;
    for r in records {
        writer.write_record([
            r.year.to_string(),
            r.distance.to_string(),
            r.owner.to_string(),
            r.fuel.clone(),
            r.location.clone(),
            r.drive.clone(),
            r.body_type.clone(),
            r.brand.clone(),
            r.model.clone(),
            r.price.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    atomic_write(path, &bytes)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Wrote records");
    Ok(())
}

/// Write arbitrary rows under the given header order.
pub fn write_rows(path: &Path, headers: &[String], rows: &[RawRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(headers.iter().map(|h| render_cell(row.get(h))))?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    atomic_write(path, &bytes)?;
    Ok(())
}

fn render_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RAW: &str = "\
,Car Name,Year,Distance,Owner,Fuel,Location,Drive,Type,Price
0,Maruti S PRESSO LXI,2022,3878,1,PETROL,HR-98,Manual,HatchBack,514000
1,Hyundai Creta SX,2020, ,1,DIESEL,KA-05,Manual,SUV,1150000
";

    #[test]
    fn test_read_csv_skips_index_column() {
        let table = read_csv_from(RAW.as_bytes()).unwrap();
        assert_eq!(table.headers[0], "Car Name");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0]["Car Name"], "Maruti S PRESSO LXI");
        assert!(!table.rows[0].contains_key(""));
    }

    #[test]
    fn test_read_csv_blank_cells_are_null() {
        let table = read_csv_from(RAW.as_bytes()).unwrap();
        assert_eq!(table.rows[1]["Distance"], Value::Null);
    }

    #[test]
    fn test_short_row_reads_as_nulls() {
        let data = "Year,Fuel,Drive,Price\n2020,PETROL\n";
        let table = read_csv_from(data.as_bytes()).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0]["Year"], Value::String("2020".into()));
        assert_eq!(table.rows[0]["Drive"], Value::Null);
        assert_eq!(table.rows[0]["Price"], Value::Null);
    }

    #[test]
    fn test_unnamed_header_is_skipped() {
        let data = "Unnamed: 0,Year\n0,2020\n";
        let table = read_csv_from(data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["Year".to_string()]);
    }

    #[test]
    fn test_write_records_round_trips_through_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean.csv");
        let schema = Schema::current();
        let table = read_csv_from(RAW.as_bytes()).unwrap();
        let record = schema.validate_row(0, &table.rows[0]).unwrap();

        write_records(&path, &schema, std::slice::from_ref(&record)).unwrap();
        let reread = read_csv(&path).unwrap();
        assert_eq!(reread.headers, schema.record_headers());
        assert_eq!(schema.validate(&reread.rows).unwrap(), vec![record]);
    }

    #[test]
    fn test_write_rows_renders_numbers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut row = RawRow::new();
        row.insert("Brand".into(), Value::String("Kia".into()));
        row.insert("Predicted_Price".into(), serde_json::json!(812345.5));

        write_rows(&path, &["Brand".into(), "Predicted_Price".into()], &[row]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Brand,Predicted_Price\nKia,812345.5\n");
    }
}
