//! Driver traits and registry for metadata access.
//!
//! A [`Driver`] turns a resolved URL into a live [`MetadataConnection`].
//! The connection exposes the standard metadata calls (schemas, tables,
//! columns, keys, indexes, routines) as [`MetadataRow`]s using JDBC-style
//! column names, plus a raw `query` used for vendor SQL resources.
//!
//! # Module Structure
//! - `helpers`: row conversion and table-type filtering shared by adapters
//! - Database-specific modules (postgres, sqlite), each behind its feature
//!
//! # Object Safety
//! Both traits are object-safe; the crawler only ever sees
//! `&dyn MetadataConnection`.

use crate::config::ConnectionConfig;
use crate::models::DatabaseInfo;
use crate::records::MetadataRow;
use crate::{Result, error::DbCrawlerError};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub mod helpers;

#[cfg(feature = "postgresql")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Version reported for the sqlx-backed drivers
pub const SQLX_DRIVER_VERSION: &str = "0.8";

/// An open metadata connection.
///
/// # Security Guarantees
/// - Connections are opened read-only unless configured otherwise
/// - Implementations hold no credentials after connecting
///
/// Optional calls default to [`DbCrawlerError::UnsupportedFeature`], which
/// the crawler records as a warning rather than a failure.
#[async_trait]
pub trait MetadataConnection: Send + Sync {
    /// Name of the driver that opened this connection
    fn driver_name(&self) -> &str;

    /// Product and driver identification.
    async fn database_info(&self) -> Result<DatabaseInfo>;

    /// Number of statements that can run at once, up to `wanted`.
    ///
    /// Implementations must check rather than assume; the default is a
    /// single statement at a time.
    async fn probe_capacity(&self, wanted: usize) -> usize {
        let _ = wanted;
        1
    }

    /// Schemas (`TABLE_CATALOG`, `TABLE_SCHEM`).
    async fn schemas(&self) -> Result<Vec<MetadataRow>>;

    /// Tables of one schema whose type is in `table_types` (empty means all).
    async fn tables(&self, schema: &str, table_types: &[String]) -> Result<Vec<MetadataRow>>;

    /// Columns of one table.
    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>>;

    /// Primary key columns of one table.
    async fn primary_keys(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        let _ = (schema, table);
        Err(DbCrawlerError::unsupported_feature("primary keys", self.driver_name()))
    }

    /// Foreign keys declared on one table.
    async fn imported_keys(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        let _ = (schema, table);
        Err(DbCrawlerError::unsupported_feature("foreign keys", self.driver_name()))
    }

    /// Index columns of one table.
    async fn indexes(&self, schema: &str, table: &str) -> Result<Vec<MetadataRow>> {
        let _ = (schema, table);
        Err(DbCrawlerError::unsupported_feature("indexes", self.driver_name()))
    }

    /// Procedures and functions of one schema.
    async fn routines(&self, schema: &str) -> Result<Vec<MetadataRow>> {
        let _ = schema;
        Err(DbCrawlerError::unsupported_feature("routines", self.driver_name()))
    }

    /// Parameters and result columns of every routine in one schema.
    async fn routine_columns(&self, schema: &str) -> Result<Vec<MetadataRow>> {
        let _ = schema;
        Err(DbCrawlerError::unsupported_feature("routine columns", self.driver_name()))
    }

    /// Runs a read-only metadata query.
    async fn query(&self, sql: &str) -> Result<Vec<MetadataRow>>;

    /// Closes the connection gracefully.
    async fn close(&self) {}
}

/// Factory for metadata connections of one database family.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Driver name used in logs
    fn name(&self) -> &'static str;

    /// Driver version used in logs
    fn version(&self) -> &'static str {
        SQLX_DRIVER_VERSION
    }

    /// Whether this driver handles `url`.
    fn accepts_url(&self, url: &str) -> bool;

    /// Connection properties this driver understands.
    ///
    /// The resolver drops every other property except `user` and `password`.
    fn property_names(&self) -> &'static [&'static str];

    /// Opens a connection.
    ///
    /// # Errors
    /// Returns `Connection { kind: ConnectFailed, .. }` with a redacted
    /// context when the database rejects the attempt.
    async fn connect(
        &self,
        url: &str,
        properties: &BTreeMap<String, String>,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn MetadataConnection>>;
}

/// Ordered set of drivers; the first driver accepting a URL wins.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.drivers.iter().map(|d| d.name()))
            .finish()
    }
}

impl DriverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every driver compiled into this build.
    pub fn with_default_drivers() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "postgresql")]
        {
            registry = registry.register(postgres::PostgresDriver);
        }
        #[cfg(feature = "sqlite")]
        {
            registry = registry.register(sqlite::SqliteDriver);
        }
        registry
    }

    /// Appends a driver.
    pub fn register(mut self, driver: impl Driver + 'static) -> Self {
        self.drivers.push(Box::new(driver));
        self
    }

    /// First driver accepting `url`.
    pub fn find(&self, url: &str) -> Option<&dyn Driver> {
        self.drivers
            .iter()
            .find(|d| d.accepts_url(url))
            .map(|d| d.as_ref())
    }

    /// Registered driver names
    pub fn names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_finds_drivers() {
        let registry = DriverRegistry::with_default_drivers();
        #[cfg(feature = "postgresql")]
        assert!(registry.find("postgresql://localhost/app").is_some());
        #[cfg(feature = "sqlite")]
        assert!(registry.find("sqlite:///tmp/app.db").is_some());
        assert!(registry.find("oracle://localhost/xe").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = DriverRegistry::new();
        assert!(registry.find("sqlite::memory:").is_none());
        assert!(registry.names().is_empty());
    }
}
