// 📐 Shape Layer - Declared Relation Schemas
// Column names and types for the movies and ratings relations, checked against CSV headers

use anyhow::{bail, Result};
use std::fmt;

// ============================================================================
// COLUMN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Real,
}

impl ColumnType {
    /// SQLite type name used in CREATE TABLE (drives column affinity)
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

impl Column {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self { name, column_type }
    }
}

// ============================================================================
// TABLE SCHEMA
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    /// Relation name in the store
    pub name: &'static str,
    /// Default file the relation is loaded from
    pub source_file: &'static str,
    pub columns: &'static [Column],
}

pub static MOVIES: TableSchema = TableSchema {
    name: "movies",
    source_file: "movies.csv",
    columns: &[
        Column::new("tconst", ColumnType::Text),
        Column::new("titleType", ColumnType::Text),
        Column::new("primaryTitle", ColumnType::Text),
        Column::new("runtimeMinutes", ColumnType::Integer),
        Column::new("genres", ColumnType::Text),
    ],
};

pub static RATINGS: TableSchema = TableSchema {
    name: "ratings",
    source_file: "ratings.csv",
    columns: &[
        Column::new("tconst", ColumnType::Text),
        Column::new("averageRating", ColumnType::Real),
        Column::new("numVotes", ColumnType::Integer),
    ],
};

impl TableSchema {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// No constraints: uniqueness and referential integrity are not enforced.
    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.column_type))
            .collect::<Vec<_>>()
            .join(", ");

        format!("CREATE TABLE \"{}\" ({})", self.name, columns)
    }

    pub fn drop_table_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name)
    }

    pub fn insert_sql(&self) -> String {
        let names = self
            .columns
            .iter()
            .map(|c| format!("\"{}\"", c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.name, names, placeholders
        )
    }

    /// Match a CSV header row against the declared columns.
    ///
    /// Returns, for each declared column in order, the index of the header
    /// field holding it. Every declared column must appear exactly once;
    /// undeclared header fields are reported back so the caller can log them.
    pub fn resolve_header<'h>(&self, header: &[&'h str]) -> Result<HeaderMapping<'h>> {
        let mut indexes = Vec::with_capacity(self.columns.len());

        for column in self.columns {
            let positions: Vec<usize> = header
                .iter()
                .enumerate()
                .filter(|(_, field)| field.trim() == column.name)
                .map(|(i, _)| i)
                .collect();

            match positions.as_slice() {
                [index] => indexes.push(*index),
                [] => bail!(
                    "schema mismatch for '{}': header is missing column '{}'",
                    self.name,
                    column.name
                ),
                _ => bail!(
                    "schema mismatch for '{}': header names column '{}' {} times",
                    self.name,
                    column.name,
                    positions.len()
                ),
            }
        }

        let ignored = header
            .iter()
            .enumerate()
            .filter(|(i, _)| !indexes.contains(i))
            .map(|(_, field)| *field)
            .collect();

        Ok(HeaderMapping { indexes, ignored })
    }
}

/// Result of [`TableSchema::resolve_header`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMapping<'h> {
    pub indexes: Vec<usize>,
    pub ignored: Vec<&'h str>,
}
