//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Bare file path ending in `.db`, `.sqlite` or `.sqlite3`
//! - In-memory: `sqlite::memory:`
//!
//! # Security Features
//! - Opens databases read-only by default and never creates missing files
//! - No network access required

use crate::config::ConnectionConfig;
use crate::error::{ConnectionErrorKind, redact_database_url};
use crate::security::{PASSWORD_PROPERTY, USER_PROPERTY};
use crate::{Result, error::DbCrawlerError};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Properties forwarded to SQLite. `user` and `password` are accepted but
/// SQLite ignores them.
pub const PROPERTY_NAMES: &[&str] = &[USER_PROPERTY, PASSWORD_PROPERTY, "immutable", "vfs"];

const FILE_EXTENSIONS: &[&str] = &[".db", ".sqlite", ".sqlite3"];

/// Whether `url` names a SQLite database.
pub(crate) fn is_sqlite_url(url: &str) -> bool {
    url.starts_with("sqlite:") || FILE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// Builds connect options from the URL, filtered properties and config.
pub(crate) fn connect_options(
    url: &str,
    properties: &BTreeMap<String, String>,
    config: &ConnectionConfig,
) -> Result<SqliteConnectOptions> {
    let options = if url.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(url).map_err(|e| DbCrawlerError::Connection {
            kind: ConnectionErrorKind::InvalidUrl,
            context: format!("Invalid SQLite URL {}", redact_database_url(url)),
            source: Some(Box::new(e)),
        })?
    } else {
        SqliteConnectOptions::new().filename(url)
    };

    let mut options = options
        .read_only(config.read_only)
        .create_if_missing(false)
        .busy_timeout(config.query_timeout);

    if properties
        .get("immutable")
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    {
        options = options.immutable(true);
    }
    if let Some(vfs) = properties.get("vfs") {
        options = options.vfs(vfs.clone());
    }

    Ok(options)
}

/// Opens a single-connection pool.
pub(crate) async fn create_pool(
    url: &str,
    properties: &BTreeMap<String, String>,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    let options = connect_options(url, properties, config)?;

    SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| DbCrawlerError::connect_failed(format!("Failed to open {}", redact_database_url(url)), e))
}
