//! Helper utilities for adapter implementations.
//!
//! Converts driver rows into [`MetadataRow`]s. Metadata values are handled
//! as text: each column is decoded with the first Rust type its SQL type is
//! compatible with and then stringified.

use crate::records::MetadataRow;

/// Keeps rows whose `TABLE_TYPE` is in `table_types` (case-insensitive).
///
/// An empty filter keeps every row.
pub fn retain_table_types(rows: Vec<MetadataRow>, table_types: &[String]) -> Vec<MetadataRow> {
    if table_types.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            row.get("TABLE_TYPE")
                .is_some_and(|t| table_types.iter().any(|wanted| wanted.eq_ignore_ascii_case(t)))
        })
        .collect()
}

#[cfg(feature = "postgresql")]
pub(crate) use pg::pg_rows;

#[cfg(feature = "postgresql")]
mod pg {
    use super::MetadataRow;
    use sqlx::postgres::PgRow;
    use sqlx::{Column, Row};

    fn value(row: &PgRow, index: usize) -> Option<String> {
        if let Ok(v) = row.try_get::<Option<String>, _>(index) {
            return v;
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            return v.map(|v| v.to_string());
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
            return v.map(|v| v.to_string());
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
            return v.map(|v| v.to_string());
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            return v.map(|v| v.to_string());
        }
        if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
            return v.map(|v| if v { "YES".to_string() } else { "NO".to_string() });
        }
        // Domains over text (information_schema) carry their own type OIDs
        row.try_get_unchecked::<Option<String>, _>(index).ok().flatten()
    }

    /// Converts PostgreSQL rows.
    pub(crate) fn pg_rows(rows: &[PgRow]) -> Vec<MetadataRow> {
        rows.iter()
            .map(|row| {
                let mut out = MetadataRow::new();
                for column in row.columns() {
                    out.insert(column.name(), value(row, column.ordinal()));
                }
                out
            })
            .collect()
    }
}

#[cfg(feature = "sqlite")]
pub(crate) use lite::sqlite_rows;

#[cfg(feature = "sqlite")]
mod lite {
    use super::MetadataRow;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Column, Row};

    fn value(row: &SqliteRow, index: usize) -> Option<String> {
        if let Ok(v) = row.try_get::<Option<String>, _>(index) {
            return v;
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
            return v.map(|v| v.to_string());
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
            return v.map(|v| v.to_string());
        }
        row.try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Converts SQLite rows.
    pub(crate) fn sqlite_rows(rows: &[SqliteRow]) -> Vec<MetadataRow> {
        rows.iter()
            .map(|row| {
                let mut out = MetadataRow::new();
                for column in row.columns() {
                    out.insert(column.name(), value(row, column.ordinal()));
                }
                out
            })
            .collect()
    }
}
