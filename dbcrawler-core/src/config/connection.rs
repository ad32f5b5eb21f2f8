//! Driver connection settings.
//!
//! This module provides the `ConnectionConfig` struct consumed by drivers
//! when opening the metadata connection for a crawl.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the metadata connection.
///
/// # Security
/// This struct intentionally does NOT store passwords or credentials.
/// Credentials travel separately in [`crate::security::Credentials`].
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use dbcrawler_core::ConnectionConfig;
///
/// let config = ConnectionConfig::new()
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_max_connections(4);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Per-statement timeout for metadata queries
    pub query_timeout: Duration,
    /// Maximum number of pooled connections available to crawl workers
    pub max_connections: u32,
    /// Whether to open the database read-only
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
            max_connections: 10,
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig(connect={}s, query={}s, max={}, {})",
            self.connect_timeout.as_secs(),
            self.query_timeout.as_secs(),
            self.max_connections,
            if self.read_only { "read-only" } else { "read-write" }
        )
    }
}

impl ConnectionConfig {
    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid or unsafe
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_connections == 0 {
            return Err(crate::error::DbCrawlerError::config(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(crate::error::DbCrawlerError::config(
                "max_connections should not exceed 100 for safety",
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(crate::error::DbCrawlerError::config(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.is_zero() {
            return Err(crate::error::DbCrawlerError::config(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Creates a new connection config with safe defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Builder method to set the statement timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Builder method to set the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Builder method to toggle read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.max_connections, 10);
        assert!(config.read_only);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_connection_config_validation() {
        let config = ConnectionConfig::new().with_max_connections(0);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::new().with_max_connections(101);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::new().with_connect_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = ConnectionConfig::new().with_query_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_config_display_has_no_secrets() {
        let display = ConnectionConfig::new().with_read_only(false).to_string();
        assert!(display.contains("read-write"));
        assert!(!display.contains("password"));
    }
}
