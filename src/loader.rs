// 📂 Dataset Loader
// CSV → typed rows for a declared relation schema

use crate::schema::{Column, ColumnType, TableSchema};
use anyhow::{anyhow, Context, Result};
use rusqlite::types::Value;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// One parsed row, values in the schema's declared column order
pub type Record = Vec<Value>;

/// Read a CSV file whose header row names the schema's columns.
pub fn read_csv(schema: &TableSchema, csv_path: &Path) -> Result<Vec<Record>> {
    let rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    read_records(schema, rdr)
        .with_context(|| format!("Failed to load '{}' from {}", schema.name, csv_path.display()))
}

/// Same as [`read_csv`] but from any reader (used by tests and in-memory fixtures).
pub fn read_csv_from_reader<R: Read>(schema: &TableSchema, reader: R) -> Result<Vec<Record>> {
    read_records(schema, csv::Reader::from_reader(reader))
        .with_context(|| format!("Failed to load '{}'", schema.name))
}

fn read_records<R: Read>(schema: &TableSchema, mut rdr: csv::Reader<R>) -> Result<Vec<Record>> {
    let header = rdr.headers().context("Failed to read CSV header")?.clone();
    let fields: Vec<&str> = header.iter().collect();
    let mapping = schema.resolve_header(&fields)?;

    if !mapping.ignored.is_empty() {
        warn!(
            table = schema.name,
            ignored = ?mapping.ignored,
            "CSV header has undeclared columns, ignoring them"
        );
    }

    let mut records = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // Line 1 is the header
        let line = i + 2;
        let row = result.with_context(|| format!("Malformed CSV row at line {}", line))?;

        let record = schema
            .columns
            .iter()
            .zip(&mapping.indexes)
            .map(|(column, &index)| {
                let raw = row.get(index).unwrap_or_default();
                parse_cell(column, raw).with_context(|| format!("line {}", line))
            })
            .collect::<Result<Record>>()?;

        records.push(record);
    }

    debug!(table = schema.name, rows = records.len(), "parsed CSV rows");

    Ok(records)
}

/// Parse one CSV cell according to its declared column type.
/// Empty cells become NULL; numeric cells are trimmed first.
pub fn parse_cell(column: &Column, raw: &str) -> Result<Value> {
    let trimmed = raw.trim();

    match column.column_type {
        ColumnType::Text if raw.is_empty() => Ok(Value::Null),
        ColumnType::Text => Ok(Value::Text(raw.to_string())),
        _ if trimmed.is_empty() => Ok(Value::Null),
        ColumnType::Integer => trimmed.parse::<i64>().map(Value::Integer).map_err(|_| {
            anyhow!("column '{}': expected integer, got '{}'", column.name, raw)
        }),
        ColumnType::Real => trimmed.parse::<f64>().map(Value::Real).map_err(|_| {
            anyhow!("column '{}': expected number, got '{}'", column.name, raw)
        }),
    }
}
