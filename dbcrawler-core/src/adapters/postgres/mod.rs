//! PostgreSQL metadata adapter with connection pooling.
//!
//! # Module Structure
//! - `connection`: connect options, session settings and pool creation
//! - `queries`: catalog queries backing the standard metadata calls
//!
//! # Security Guarantees
//! - Sessions default to `default_transaction_read_only = on`
//! - `statement_timeout` bounds every metadata query
//! - Connection strings are redacted in error messages

mod connection;
mod queries;


use super::helpers::{pg_rows, retain_table_types};
use super::{Driver, MetadataConnection, SQLX_DRIVER_VERSION};
use crate::config::ConnectionConfig;
use crate::models::DatabaseInfo;
use crate::records::MetadataRow;
use crate::{Result, error::DbCrawlerError};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;

pub use connection::PROPERTY_NAMES;

/// Driver for `postgres://` and `postgresql://` URLs
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDriver;

#[async_trait]
impl Driver for PostgresDriver {
    fn name(&self) -> &'static str {
        "sqlx-postgres"
    }

    fn accepts_url(&self, url: &str) -> bool {
        url.starts_with("postgres://") || url.starts_with("postgresql://")
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
        Ok(Box::new(PostgresConnection { pool }))
    }
}

/// Pooled PostgreSQL metadata connection
pub struct PostgresConnection {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

impl PostgresConnection {
    async fn fetch(&self, sql: &str, binds: &[&str], context: &str) -> Result<Vec<MetadataRow>> {
        let mut query = sqlx::query(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DbCrawlerError::query_error(format!("Failed to query {}", context), e))?;
        Ok(pg_rows(&rows))
    }
}

#[async_trait]
impl MetadataConnection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "sqlx-postgres"
    }

    async fn database_info(&self) -> Result<DatabaseInfo> {
        let version: String = sqlx::query_scalar("SELECT current_setting('server_version')")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbCrawlerError::query_error("Failed to get PostgreSQL version", e))?;

        Ok(DatabaseInfo {
            product_name: "PostgreSQL".to_string(),
            product_version: version,
            driver_name: self.driver_name().to_string(),
            driver_version: SQLX_DRIVER_VERSION.to_string(),
        })
    }

    /// Holds up to `wanted` pooled connections at once to see how many the
    /// server actually grants.
    async fn probe_capacity(&self, wanted: usize) -> usize {
        let max = usize::try_from(self.pool.options().get_max_connections()).unwrap_or(1);
        let target = wanted.min(max);
        let mut held = Vec::with_capacity(target);
        while held.len() < target {
            match self.pool.acquire().await {
                Ok(conn) => held.push(conn),
                Err(e) => {
                    tracing::debug!("Connection probe stopped at {}: {}", held.len(), e);
                    break;
                }
            }
        }
        held.len().max(1)
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

    async fn routines(&self, schema: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::ROUTINES, &[schema], "routines").await
    }

    async fn routine_columns(&self, schema: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(queries::ROUTINE_COLUMNS, &[schema], "routine columns")
            .await
    }

    async fn query(&self, sql: &str) -> Result<Vec<MetadataRow>> {
        self.fetch(sql, &[], "metadata resource").await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
