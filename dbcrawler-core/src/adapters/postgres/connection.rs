//! PostgreSQL connection pool management.
//!
//! # Security Features
//! - Every pooled session is read-only unless configured otherwise
//! - `statement_timeout` is applied through startup options
//! - Connection failures are reported with a redacted URL

use crate::config::ConnectionConfig;
use crate::error::{ConnectionErrorKind, redact_database_url};
use crate::security::{PASSWORD_PROPERTY, USER_PROPERTY};
use crate::{Result, error::DbCrawlerError};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Properties forwarded to PostgreSQL
pub const PROPERTY_NAMES: &[&str] = &[
    USER_PROPERTY,
    PASSWORD_PROPERTY,
    "application_name",
    "sslmode",
    "sslrootcert",
    "search_path",
];

const DEFAULT_APPLICATION_NAME: &str = "dbcrawler";

/// Builds connect options from the URL, filtered properties and config.
pub(crate) fn connect_options(
    url: &str,
    properties: &BTreeMap<String, String>,
    config: &ConnectionConfig,
) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::from_str(url).map_err(|e| DbCrawlerError::Connection {
        kind: ConnectionErrorKind::InvalidUrl,
        context: format!("Invalid PostgreSQL URL {}", redact_database_url(url)),
        source: Some(Box::new(e)),
    })?;

    if let Some(user) = properties.get(USER_PROPERTY) {
        options = options.username(user);
    }
    if let Some(password) = properties.get(PASSWORD_PROPERTY) {
        options = options.password(password);
    }

    options = options.application_name(
        properties
            .get("application_name")
            .map_or(DEFAULT_APPLICATION_NAME, String::as_str),
    );

    if let Some(mode) = properties.get("sslmode") {
        let mode = PgSslMode::from_str(mode)
            .map_err(|_| DbCrawlerError::config(format!("Invalid sslmode '{}'", mode)))?;
        options = options.ssl_mode(mode);
    }
    if let Some(root_cert) = properties.get("sslrootcert") {
        options = options.ssl_root_cert(root_cert.as_str());
    }

    let mut settings = vec![(
        "statement_timeout".to_string(),
        config.query_timeout.as_millis().to_string(),
    )];
    if config.read_only {
        settings.push(("default_transaction_read_only".to_string(), "on".to_string()));
    }
    if let Some(search_path) = properties.get("search_path") {
        settings.push(("search_path".to_string(), search_path.clone()));
    }

    Ok(options.options(settings))
}

/// Creates a pool and opens its first connection.
///
/// # Errors
/// Returns `ConnectFailed` if the server cannot be reached or rejects the
/// credentials; the URL in the message is redacted.
pub(crate) async fn create_pool(
    url: &str,
    properties: &BTreeMap<String, String>,
    config: &ConnectionConfig,
) -> Result<PgPool> {
    let options = connect_options(url, properties, config)?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(0)
        .acquire_timeout(config.connect_timeout)
        .test_before_acquire(true)
        .connect_with(options)
        .await
        .map_err(|e| {
            DbCrawlerError::connect_failed(
                format!("Failed to connect to {}", redact_database_url(url)),
                e,
            )
        })
}
