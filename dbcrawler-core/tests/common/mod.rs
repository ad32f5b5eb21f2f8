//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dbcrawler_core::records::MetadataRow;
use dbcrawler_core::{DatabaseInfo, DbCrawlerError, MetadataConnection, Result};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub const SCHEMA: &str = "APP";

fn row(values: &[(&str, &str)]) -> MetadataRow {
    values
        .iter()
        .fold(MetadataRow::new(), |row, (k, v)| row.with(k, *v))
}

fn column(table: &str, name: &str, ordinal: u32, type_name: &str) -> MetadataRow {
    let ordinal = ordinal.to_string();
    row(&[
        ("TABLE_SCHEM", SCHEMA),
        ("TABLE_NAME", table),
        ("COLUMN_NAME", name),
        ("ORDINAL_POSITION", ordinal.as_str()),
        ("TYPE_NAME", type_name),
        ("IS_NULLABLE", "YES"),
    ])
}

/// Scripted metadata connection for a product the crawler treats as generic.
///
/// Holds the AUTHORS/BOOKS library: `BOOKS(ID, TITLE, AUTHOR_ID)` with
/// `BOOKS.AUTHOR_ID -> AUTHORS.ID`.
pub struct FakeConnection {
    product_name: String,
    failing_queries: Vec<String>,
    query_rows: Vec<(String, Vec<MetadataRow>)>,
    fail_tables: bool,
    unsupported_indexes: bool,
    cancel_on_tables: Option<CancellationToken>,
    statements: Mutex<Vec<String>>,
}

impl FakeConnection {
    pub fn library() -> Self {
        Self {
            product_name: "Apache Derby".to_string(),
            failing_queries: Vec::new(),
            query_rows: Vec::new(),
            fail_tables: false,
            unsupported_indexes: false,
            cancel_on_tables: None,
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn with_product_name(mut self, product_name: &str) -> Self {
        self.product_name = product_name.to_string();
        self
    }

    /// Resource queries containing `marker` fail.
    pub fn with_failing_query(mut self, marker: &str) -> Self {
        self.failing_queries.push(marker.to_ascii_lowercase());
        self
    }

    /// Resource queries containing `marker` return `rows`.
    pub fn with_query_rows(mut self, marker: &str, rows: Vec<MetadataRow>) -> Self {
        self.query_rows.push((marker.to_ascii_lowercase(), rows));
        self
    }

    pub fn with_failing_tables(mut self) -> Self {
        self.fail_tables = true;
        self
    }

    pub fn with_unsupported_indexes(mut self) -> Self {
        self.unsupported_indexes = true;
        self
    }

    /// Cancels `token` when tables are requested.
    pub fn cancelling_on_tables(mut self, token: CancellationToken) -> Self {
        self.cancel_on_tables = Some(token);
        self
    }

    pub fn info(&self) -> DatabaseInfo {
        DatabaseInfo {
            product_name: self.product_name.clone(),
            product_version: "10.16".to_string(),
            driver_name: "fake".to_string(),
            driver_version: "1.0".to_string(),
        }
    }

    /// Every resource query run so far
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataConnection for FakeConnection {
    fn driver_name(&self) -> &str {
        "fake"
    }

    async fn database_info(&self) -> Result<DatabaseInfo> {
        Ok(self.info())
    }

    async fn probe_capacity(&self, wanted: usize) -> usize {
        wanted.min(3)
    }

    async fn schemas(&self) -> Result<Vec<MetadataRow>> {
        Ok(vec![row(&[("TABLE_SCHEM", SCHEMA)]), row(&[("TABLE_SCHEM", "SYS")])])
    }

    async fn tables(&self, schema: &str, _table_types: &[String]) -> Result<Vec<MetadataRow>> {
        if let Some(token) = &self.cancel_on_tables {
            token.cancel();
        }
        if self.fail_tables {
            return Err(DbCrawlerError::query_failed("permission denied for tables"));
        }
        if schema != SCHEMA {
            return Ok(vec![row(&[
                ("TABLE_SCHEM", schema),
                ("TABLE_NAME", "SYSTABLES"),
                ("TABLE_TYPE", "SYSTEM TABLE"),
            ])]);
        }
        Ok(["AUTHORS", "BOOKS"]
            .into_iter()
            .map(|name| {
                row(&[
                    ("TABLE_SCHEM", SCHEMA),
                    ("TABLE_NAME", name),
                    ("TABLE_TYPE", "TABLE"),
                ])
            })
            .collect())
    }

    async fn columns(&self, _schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        Ok(match table {
            "AUTHORS" => vec![
                column("AUTHORS", "ID", 1, "INTEGER"),
                column("AUTHORS", "NAME", 2, "VARCHAR"),
            ],
            "BOOKS" => vec![
                column("BOOKS", "ID", 1, "INTEGER"),
                column("BOOKS", "TITLE", 2, "VARCHAR"),
                column("BOOKS", "AUTHOR_ID", 3, "INTEGER"),
            ],
            _ => Vec::new(),
        })
    }

    async fn primary_keys(&self, _schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        let name = format!("{}_PK", table);
        Ok(vec![row(&[
            ("TABLE_SCHEM", SCHEMA),
            ("TABLE_NAME", table),
            ("COLUMN_NAME", "ID"),
            ("KEY_SEQ", "1"),
            ("PK_NAME", name.as_str()),
        ])])
    }

    async fn imported_keys(&self, _schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        if table != "BOOKS" {
            return Ok(Vec::new());
        }
        Ok(vec![row(&[
            ("FK_NAME", "BOOKS_AUTHOR_FK"),
            ("FKTABLE_SCHEM", SCHEMA),
            ("FKTABLE_NAME", "BOOKS"),
            ("FKCOLUMN_NAME", "AUTHOR_ID"),
            ("PKTABLE_SCHEM", SCHEMA),
            ("PKTABLE_NAME", "AUTHORS"),
            ("PKCOLUMN_NAME", "ID"),
            ("KEY_SEQ", "1"),
            ("DELETE_RULE", "CASCADE"),
        ])])
    }

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        if self.unsupported_indexes {
            return Err(DbCrawlerError::unsupported_feature("indexes", "fake"));
        }
        let name = format!("{}_PK_IDX", table);
        Ok(vec![row(&[
            ("TABLE_SCHEM", schema),
            ("TABLE_NAME", table),
            ("INDEX_NAME", name.as_str()),
            ("NON_UNIQUE", "NO"),
            ("COLUMN_NAME", "ID"),
            ("ORDINAL_POSITION", "1"),
        ])])
    }

    async fn routines(&self, _schema: &str) -> Result<Vec<MetadataRow>> {
        Ok(Vec::new())
    }

    async fn routine_columns(&self, _schema: &str) -> Result<Vec<MetadataRow>> {
        Ok(Vec::new())
    }

    async fn query(&self, sql: &str) -> Result<Vec<MetadataRow>> {
        self.statements.lock().unwrap().push(sql.to_string());
        let lowered = sql.to_ascii_lowercase();
        if self.failing_queries.iter().any(|m| lowered.contains(m)) {
            return Err(DbCrawlerError::query_failed("relation does not exist"));
        }
        Ok(self
            .query_rows
            .iter()
            .find(|(marker, _)| lowered.contains(marker))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}
