//! Unit tests for the SQLite adapter.
//!
//! These tests verify the SQLite adapter functionality including:
//! - URL acceptance
//! - Read-only connection setup
//! - The pragma-backed metadata calls against a real database file

use super::SqliteDriver;
use crate::adapters::{Driver, MetadataConnection};
use crate::config::ConnectionConfig;
use crate::error::ConnectionErrorKind;
use sqlx::Connection;
use std::collections::BTreeMap;

const SCHEMA: &str = r#"
    CREATE TABLE AUTHORS (ID INTEGER PRIMARY KEY, NAME TEXT NOT NULL);
    CREATE TABLE BOOKS (
        ID INTEGER PRIMARY KEY,
        TITLE TEXT,
        AUTHOR_ID INTEGER REFERENCES AUTHORS ON DELETE CASCADE
    );
    CREATE UNIQUE INDEX BOOKS_TITLE_IDX ON BOOKS (TITLE DESC);
    CREATE VIEW BOOK_TITLES AS SELECT TITLE FROM BOOKS;
"#;

async fn create_database(dir: &tempfile::TempDir) -> String {
    let path = dir.path().join("library.db");
    let url = format!("sqlite://{}", path.display());
    let options = sqlx::sqlite::SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let mut conn = sqlx::SqliteConnection::connect_with(&options).await.unwrap();
    sqlx::raw_sql(SCHEMA).execute(&mut conn).await.unwrap();
    conn.close().await.unwrap();
    url
}

async fn open(url: &str) -> Box<dyn MetadataConnection> {
    SqliteDriver
        .connect(url, &BTreeMap::new(), &ConnectionConfig::default())
        .await
        .unwrap()
}

// =============================================================================
// URL and connection tests
// =============================================================================

#[test]
fn test_accepts_sqlite_urls() {
    let driver = SqliteDriver;
    assert!(driver.accepts_url("sqlite::memory:"));
    assert!(driver.accepts_url("sqlite:///var/lib/app.db"));
    assert!(driver.accepts_url("/tmp/library.sqlite3"));
    assert!(!driver.accepts_url("postgres://localhost/db"));
}

#[tokio::test]
async fn test_missing_file_is_connect_failure() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("absent.db").display());
    let result = SqliteDriver
        .connect(&url, &BTreeMap::new(), &ConnectionConfig::default())
        .await;
    assert_eq!(
        result.err().and_then(|e| e.connection_kind()),
        Some(ConnectionErrorKind::ConnectFailed)
    );
}

#[tokio::test]
async fn test_sqlite_database_info() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;

    let info = conn.database_info().await.unwrap();
    assert_eq!(info.product_name, "SQLite");
    assert!(info.product_version.starts_with('3'));
    assert_eq!(conn.probe_capacity(8).await, 1);
}

// =============================================================================
// Metadata call tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_schemas_and_tables() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;

    let schemas = conn.schemas().await.unwrap();
    assert_eq!(schemas.len(), 1);
    assert_eq!(schemas[0].get("TABLE_SCHEM"), Some("main"));

    let tables = conn.tables("main", &["TABLE".to_string()]).await.unwrap();
    let names: Vec<_> = tables.iter().filter_map(|r| r.get("TABLE_NAME")).collect();
    assert_eq!(names, vec!["AUTHORS", "BOOKS"]);

    let everything = conn.tables("main", &[]).await.unwrap();
    assert!(everything
        .iter()
        .any(|r| r.get("TABLE_TYPE") == Some("VIEW") && r.get("TABLE_NAME") == Some("BOOK_TITLES")));
}

#[tokio::test]
async fn test_sqlite_columns_and_primary_key() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;

    let columns = conn.columns("main", "AUTHORS").await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].get("COLUMN_NAME"), Some("ID"));
    assert_eq!(columns[0].get("ORDINAL_POSITION"), Some("1"));
    assert_eq!(columns[0].get("IS_AUTOINCREMENT"), Some("YES"));
    assert_eq!(columns[1].get("IS_NULLABLE"), Some("NO"));

    let keys = conn.primary_keys("main", "AUTHORS").await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].get("COLUMN_NAME"), Some("ID"));
    assert_eq!(keys[0].get("KEY_SEQ"), Some("1"));
}

#[tokio::test]
async fn test_sqlite_foreign_key_defaults_to_parent_primary_key() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;

    let keys = conn.imported_keys("main", "BOOKS").await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].get("FKCOLUMN_NAME"), Some("AUTHOR_ID"));
    assert_eq!(keys[0].get("PKTABLE_NAME"), Some("AUTHORS"));
    assert_eq!(keys[0].get("PKCOLUMN_NAME"), Some("ID"));
    assert_eq!(keys[0].get("DELETE_RULE"), Some("CASCADE"));
    assert_eq!(keys[0].get("FK_NAME"), Some("BOOKS_0_fkey"));
}

#[tokio::test]
async fn test_sqlite_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;

    let indexes = conn.indexes("main", "BOOKS").await.unwrap();
    let title = indexes
        .iter()
        .find(|r| r.get("INDEX_NAME") == Some("BOOKS_TITLE_IDX"))
        .unwrap();
    assert_eq!(title.get("NON_UNIQUE"), Some("NO"));
    assert_eq!(title.get("COLUMN_NAME"), Some("TITLE"));
    assert_eq!(title.get("ASC_OR_DESC"), Some("D"));
}

#[tokio::test]
async fn test_sqlite_routines_are_empty() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;
    assert!(conn.routines("main").await.unwrap().is_empty());
    assert!(conn.routine_columns("main").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_connection_is_read_only() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open(&create_database(&dir).await).await;
    assert!(conn.query("CREATE TABLE T (X INTEGER)").await.is_err());
    conn.close().await;
}
