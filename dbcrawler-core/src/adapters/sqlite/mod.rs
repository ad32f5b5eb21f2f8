//! SQLite metadata adapter.
//!
//! # Module Structure
//! - `connection`: URL acceptance and read-only connection setup
//! - `queries`: pragma queries backing the standard metadata calls
//!
//! # SQLite-Specific Features
//! - Metadata comes from `pragma_*` table-valued functions
//! - A single connection; statements are never run concurrently
//! - SQLite has no stored routines, so routine calls return no rows

mod connection;
mod queries;

#[cfg(test)]
mod tests;

use super::helpers::{retain_table_types, sqlite_rows};
use super::{Driver, MetadataConnection, SQLX_DRIVER_VERSION};
use crate::config::ConnectionConfig;
use crate::models::DatabaseInfo;
use crate::records::MetadataRow;
use crate::{Result, error::DbCrawlerError};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

pub use connection::PROPERTY_NAMES;

/// Driver for `sqlite:` URLs and bare database file paths
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlx-sqlite"
    }

    fn accepts_url(&self, url: &str) -> bool {
        connection::is_sqlite_url(url)
    }

    fn property_names(&self) -> &'static [&'static str] {
        PROPERTY_NAMES
    }

    async fn connect(
        &self,
        url: &str,
        properties: &BTreeMap<String, String>,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn MetadataConnection>> {
        let pool = connection::create_pool(url, properties, config).await?;
        Ok(Box::new(SqliteConnection { pool }))
    }
}

/// Single-connection SQLite metadata connection
pub struct SqliteConnection {
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("pool_size", &self.pool.size())
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    async fn fetch(&self, sql: &str, binds: &[&str], context: &str) -> Result<Vec<MetadataRow>> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbCrawlerError::query_error(format!("Failed to query {}", context), e))?;
        Ok(sqlite_rows(&rows))
    }
}

#[async_trait]
impl MetadataConnection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlx-sqlite"
    }

    async fn database_info(&self) -> Result<DatabaseInfo> {
        let version: String = sqlx::query_scalar("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbCrawlerError::query_error("Failed to get SQLite version", e))?;

        Ok(DatabaseInfo {
            product_name: "SQLite".to_string(),
            product_version: version,
            driver_name: self.driver_name().to_string(),
            driver_version: SQLX_DRIVER_VERSION.to_string(),
        })
    }

    async fn schemas(&self) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::SCHEMAS, &[], "schemas").await
    }

    async fn tables(&self, schema: &str, table_types: &[String]) -> Result<Vec<MetadataRow>> {
        let rows = self.fetch(queries::TABLES, &[schema], "tables").await?;
        Ok(retain_table_types(rows, table_types))
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::COLUMNS, &[schema, table], "columns").await
    }

    async fn primary_keys(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::PRIMARY_KEYS, &[schema, table], "primary keys")
            .await
    }

    async fn imported_keys(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::IMPORTED_KEYS, &[schema, table], "foreign keys")
            .await
    }

    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::INDEXES, &[schema, table], "indexes").await
    }

    async fn routines(&self, _schema: &str) -> Result<Vec<MetadataRow>> {
        Ok(Vec::new())
    }

    async fn routine_columns(&self, _schema: &str) -> Result<Vec<MetadataRow>> {
        Ok(Vec::new())
    }

    async fn query(&self, sql: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(sql, &[], "metadata resource").await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
